//! Business logic layer

pub mod auth;
pub mod client;
pub mod resolution;
pub mod tenant;
pub mod user;

pub use auth::{extract_tenant_selector, Argon2PasswordVerifier, AuthService, PasswordVerifier};
pub use client::ClientService;
pub use resolution::ClientResolutionService;
pub use tenant::TenantService;
pub use user::UserService;
