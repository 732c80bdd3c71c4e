//! Data access layer (Repository pattern)

pub mod client;
pub mod tenant;
pub mod user;

pub use client::{ClientRepository, ClientRepositoryImpl};
pub use tenant::{TenantRepository, TenantRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};

use crate::error::AppError;

/// Map a unique-index violation onto `Conflict`, everything else onto `Database`.
pub(crate) fn map_unique_violation(err: sqlx::Error, conflict_message: String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(conflict_message)
        }
        _ => AppError::Database(err),
    }
}
