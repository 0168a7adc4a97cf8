//! Session management for the admin console.
//!
//! This module owns the access/refresh token pair, its durable storage
//! and the login/logout/refresh exchanges against the auth service.

mod auth;
mod store;

pub use auth::Session;
pub use store::{AuthStatus, FileStorage, MemoryStorage, TokenPair, TokenStorage, TokenStore};
