//! Tessera Core - Multi-Tenant Identity Backend
//!
//! This crate provides the domain core of the Tessera identity service:
//! the Tenant/Client/User aggregate model, client resolution for the
//! external OAuth2/OIDC protocol engine, tenant-scoped authentication,
//! the user lifecycle state machine, and asynchronous domain event
//! dispatch.

pub mod cache;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod events;
pub mod jwt;
pub mod repository;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
