//! Domain models for Tessera Core

pub mod client;
pub mod common;
pub mod event;
pub mod session;
pub mod tenant;
pub mod user;

pub use client::*;
pub use common::*;
pub use event::*;
pub use session::*;
pub use tenant::*;
pub use user::*;
