// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between storefront clients and the server.
//! This module defines the JSON request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`
/// # Fields
/// * `email` - Account identifier
/// * `password` - Plain-text password, never persisted
#[derive(Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`
/// # Fields
/// * `email` - Account identifier, must be unique
/// * `password` - Plain-text password, checked against the password policy
#[derive(Deserialize, Serialize, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

// Passwords stay out of Debug output.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Returned after a successful registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountResponse {
    /// Newly assigned account id
    pub id: String,
    /// Registered identifier
    pub email: String,
}

/// Returned after a successful login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    /// Signed session token
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// The caller's identity as seen by the server (`GET /me`)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentityResponse {
    pub user_id: String,
    pub email: String,
}

/// Uniform error body: `{ "error": <message> }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// A store in the catalog
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Catalog-wide unique id
    pub id: u64,
    /// Display name
    pub name: String,
    /// City the store is located in
    pub city: String,
    /// When the store was added to the catalog
    pub created_at: DateTime<Utc>,
}

/// One page of a keyset-paginated listing
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Page<T> {
    /// Items on this page, in listing order
    pub items: Vec<T>,
    /// Cursor for the following page, absent on the last page
    pub next_cursor: Option<String>,
}
