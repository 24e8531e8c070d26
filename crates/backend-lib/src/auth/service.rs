use async_trait::async_trait;
use storefront_common::AccountResponse;

use super::SessionClaims;
use crate::error::AppError;

/// A freshly signed token and the claims inside it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate, hash and store a new account
    async fn register(&self, email: &str, password: String) -> Result<AccountResponse, AppError>;
    /// Check credentials and issue a session token
    async fn login(&self, email: &str, password: String) -> Result<IssuedToken, AppError>;
}
