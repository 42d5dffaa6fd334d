//! Bearer-token request gate.
//!
//! Extracts the token from `Authorization: Bearer <token>`, verifies it via
//! the token service, and attaches the resolved [`AccessClaims`] to the
//! request's extensions. Handlers read the claims back through
//! [`current_user`], an explicit two-valued lookup, so the unauthenticated
//! branch is an error path rather than a panic.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::app_state::AppState;
use crate::domain::AccessClaims;
use crate::errors::{AuthError, GateError};

const BEARER_PREFIX: &str = "Bearer ";

fn bearer_token(headers: &HeaderMap) -> Result<&str, GateError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(GateError::MissingToken)?
        .to_str()
        .map_err(|_| GateError::InvalidFormat)?;

    header
        .strip_prefix(BEARER_PREFIX)
        .filter(|t| !t.is_empty())
        .ok_or(GateError::InvalidFormat)
}

/// Reject the request unless it carries a valid, unrevoked access token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let token = bearer_token(request.headers())?;

    let claims = state
        .token_service
        .verify_access_token(token)
        .await
        .map_err(|e| {
            if e == AuthError::BadSignature {
                // Signature mismatch means a forged or tampered token.
                log::warn!("rejected bearer token with invalid signature");
            }
            GateError::Token(e)
        })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Verify the token when one is present, but let anonymous requests through.
/// An expired token is reported back via `X-Token-Expired` so clients can
/// refresh proactively; a revoked one is still rejected outright.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).ok().map(str::to_owned);
    let Some(token) = token else {
        return next.run(request).await;
    };

    match state.token_service.verify_access_token(&token).await {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(AuthError::Expired) => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-token-expired", HeaderValue::from_static("true"));
            response
        }
        Err(e @ AuthError::Revoked) => e.into_response(),
        Err(_) => next.run(request).await,
    }
}

/// Claims attached by the gate, if the request was authenticated.
pub fn current_user(extensions: &axum::http::Extensions) -> Option<&AccessClaims> {
    extensions.get::<AccessClaims>()
}

/// Convenience for ownership checks ("author or admin").
pub fn current_user_id(extensions: &axum::http::Extensions) -> Option<u64> {
    current_user(extensions).map(|claims| claims.user_id)
}
