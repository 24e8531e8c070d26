// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and identity handlers.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use storefront_common::{IdentityResponse, LoginRequest, RegisterRequest, TokenResponse};

use crate::auth::SESSION_TTL;
use crate::config::AuthSettings;
use crate::error::AppError;
use crate::middleware::Identity;
use crate::AppState;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}

/// `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(settings: &AuthSettings, token: &str) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        settings.cookie_name,
        token,
        SESSION_TTL.num_seconds()
    );
    if settings.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(format!("session cookie: {e}")))
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let RegisterRequest { email, password } = body(payload)?;
    let account = state.auth.register(&email, password).await?;
    Ok((StatusCode::CREATED, Json(account)).into_response())
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let LoginRequest { email, password } = body(payload)?;
    let issued = state.auth.login(&email, password).await?;

    let cookie = session_cookie(&state.settings.auth, &issued.token)?;
    let response = TokenResponse {
        token: issued.token,
        expires_at: issued.claims.expires_at(),
    };
    Ok((
        StatusCode::OK,
        [
            (header::SET_COOKIE, cookie),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        Json(response),
    )
        .into_response())
}

/// `GET /me`
pub async fn me(identity: Identity) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        user_id: identity.user_id,
        email: identity.email,
    })
}
