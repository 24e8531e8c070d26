//! Session-token gate for protected routes.
//!
//! A request moves `Unauthenticated -> TokenPresent -> Verified -> Forwarded`
//! or stops at `Rejected`. The client only learns whether a token was
//! missing or unusable, never why.
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use storefront_common::ErrorBody;

use crate::auth::{SessionClaims, TokenService};
use crate::metrics::AUTH_MIDDLEWARE;

/// Authenticated caller, attached to request extensions by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
}

impl AuthRejection {
    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::MissingToken => "Authentication required",
            AuthRejection::InvalidToken => "Invalid token",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message().to_string(),
        };
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(body),
        )
            .into_response()
    }
}

/// What the middleware needs: the verifier and where to look for a token
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    cookie_name: Arc<str>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            tokens,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Find the bearer credential: `Authorization: Bearer` first, then the session cookie
pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        // auth scheme names are case-insensitive
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty());
    if from_header.is_some() {
        return from_header;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

/// Resolve an optional token to an identity
pub fn authenticate(tokens: &TokenService, token: Option<&str>) -> Result<Identity, AuthRejection> {
    let Some(token) = token else {
        return Err(AuthRejection::MissingToken);
    };
    match tokens.verify(token) {
        Ok(claims) => Ok(claims.into()),
        Err(reason) => {
            // The reason stays in server logs.
            tracing::debug!(%reason, "session token rejected");
            Err(AuthRejection::InvalidToken)
        },
    }
}

/// Gate middleware: forwards authenticated requests with an [`Identity`] extension
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let token = extract_token(request.headers(), &gate.cookie_name);

    let identity = match authenticate(&gate.tokens, token) {
        Ok(identity) => identity,
        Err(rejection) => {
            let outcome = match rejection {
                AuthRejection::MissingToken => "missing",
                AuthRejection::InvalidToken => "invalid",
            };
            counter!(AUTH_MIDDLEWARE, "outcome" => outcome).increment(1);
            return Err(rejection);
        },
    };

    counter!(AUTH_MIDDLEWARE, "outcome" => "forwarded").increment(1);
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present on routes behind `require_auth`.
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AuthRejection::MissingToken)
    }
}
