use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use tessera_core::cache::CacheManager;
use tessera_core::config::Config;
use tessera_core::email::{EmailProvider, SmtpEmailProvider};
use tessera_core::events::{
    event_queue, register_email_handlers, EventDispatcher, HandlerRegistry,
};
use tessera_core::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Tessera Core");

    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations completed");

    let cache_manager = if config.redis.enabled {
        match CacheManager::new(&config.redis).await {
            Ok(cache) => {
                info!("Connected to Redis cache");
                Some(cache)
            }
            Err(e) => {
                warn!("Redis unavailable, running without cache: {}", e);
                None
            }
        }
    } else {
        None
    };

    // Domain event dispatch: bounded queue, single consumer, handlers
    // registered once at startup.
    let (bus, receiver) = event_queue(config.events.queue_capacity);
    let mut registry = HandlerRegistry::new();
    if let Some(smtp) = &config.email {
        let provider: Arc<dyn EmailProvider> = Arc::new(SmtpEmailProvider::from_config(smtp)?);
        let activation_base = std::env::var("ACTIVATION_BASE_URL")
            .unwrap_or_else(|_| "https://tessera.local".to_string());
        register_email_handlers(&mut registry, provider, &activation_base);
        info!("Email handlers registered");
    } else {
        warn!("SMTP not configured; lifecycle emails disabled");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let dispatcher = EventDispatcher::new(receiver, Arc::new(registry));
    let dispatcher_handle = dispatcher.spawn(shutdown_rx);

    // Repositories and services over the pool; the transport layer that
    // serves them is wired up outside this crate.
    let state = AppState::build(config, pool, cache_manager, bus);
    info!("Service layer ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    shutdown_tx.send(true).ok();
    dispatcher_handle.await?;
    state.db_pool.close().await;
    info!("Tessera Core stopped");
    Ok(())
}
