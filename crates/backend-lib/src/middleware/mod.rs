// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the storefront HTTP server.

pub mod auth;

pub use auth::{authenticate, extract_token, require_auth, AuthGate, AuthRejection, Identity};
