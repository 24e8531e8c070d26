// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use storefront_common::ErrorBody;
use thiserror::Error;

use crate::auth::{CredentialError, SigningError};
use crate::catalog::PageError;
use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists")]
    AccountExists,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AccountExists => StatusCode::CONFLICT,
            AppError::Credential(_)
            | AppError::Signing(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::InvalidInput(_) => "VAL_002",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::AccountExists => "ACC_001",
            AppError::Credential(_) => "CRED_001",
            AppError::Signing(_) => "TOKEN_001",
            AppError::Store(_) => "STORE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Message safe to send to the client
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::AccountExists => "Account already exists".to_string(),
            AppError::Credential(_)
            | AppError::Signing(_)
            | AppError::Store(_)
            | AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => AppError::AccountExists,
            other => AppError::Store(other),
        }
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Store(e) => e.into(),
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Expected client mistakes stay below error severity.
        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation(ValidationError::TooShort).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccountExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Store(StoreError::Unknown("disk".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_error_codes() {
        assert_eq!(AppError::InvalidCredentials.error_code(), "AUTH_002");
        assert_eq!(AppError::AccountExists.error_code(), "ACC_001");
        assert_eq!(AppError::Internal("x".into()).error_code(), "INT_001");
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            AppError::from(StoreError::AlreadyExists),
            AppError::AccountExists
        ));
        assert!(matches!(
            AppError::from(StoreError::Unknown("boom".into())),
            AppError::Store(_)
        ));
        assert!(matches!(
            AppError::from(PageError::InvalidCursor),
            AppError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_validation_message_surfaced() {
        let (status, body) =
            body_of(AppError::Validation(ValidationError::PasswordMissingUpper)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({ "error": "password must contain at least one uppercase letter" })
        );
    }

    #[tokio::test]
    async fn test_internal_detail_hidden() {
        let (status, body) =
            body_of(AppError::Store(StoreError::Unknown("connection reset by peer".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            serde_json::json!({ "error": "An internal server error occurred" })
        );
    }
}
