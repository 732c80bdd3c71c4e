//! Configuration management for Tessera Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Session token configuration
    pub jwt: JwtConfig,
    /// Domain event queue configuration
    pub events: EventConfig,
    /// Outbound email configuration
    pub email: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// When false, services run without the read-through cache.
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_secs: i64,
    pub private_key_pem: Option<String>,
    pub public_key_pem: Option<String>,
}

/// Domain event dispatch configuration
#[derive(Debug, Clone)]
pub struct EventConfig {
    /// Bounded queue capacity; producers block once this many events are pending.
    pub queue_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
        }
    }
}

/// SMTP configuration for the lettre email provider
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                enabled: env::var("REDIS_ENABLED")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "https://tessera.local".to_string()),
                audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tessera".to_string()),
                session_ttl_secs: env::var("JWT_SESSION_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3600),
                private_key_pem: env::var("JWT_PRIVATE_KEY")
                    .ok()
                    .map(|value| value.replace("\\n", "\n")),
                public_key_pem: env::var("JWT_PUBLIC_KEY")
                    .ok()
                    .map(|value| value.replace("\\n", "\n")),
            },
            events: EventConfig {
                queue_capacity: env::var("EVENT_QUEUE_CAPACITY")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .unwrap_or(256),
            },
            email: Self::smtp_from_env()?,
        })
    }

    fn smtp_from_env() -> Result<Option<SmtpConfig>> {
        let host = match env::var("SMTP_HOST") {
            Ok(h) => h,
            Err(_) => return Ok(None),
        };

        Ok(Some(SmtpConfig {
            host,
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            use_tls: env::var("SMTP_USE_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            from_email: env::var("SMTP_FROM_EMAIL").context("SMTP_FROM_EMAIL is required")?,
            from_name: env::var("SMTP_FROM_NAME").ok(),
        }))
    }
}
