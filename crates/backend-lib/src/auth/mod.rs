// ============================
// storefront-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use password::{CredentialError, CredentialHasher, HashAlgorithm, DEFAULT_BCRYPT_COST};
pub use token::{SessionClaims, SigningError, SigningSecret, TokenError, TokenService, SESSION_TTL};
pub use service::{AuthService, IssuedToken};
pub use service_impl::DefaultAuth;
