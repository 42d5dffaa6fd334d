//! Per-IP admission middleware over the rate governor.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::app_state::AppState;

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Admit or reject the request based on the caller's bucket. Rejections
/// carry a `Retry-After` hint for when one token will have refilled.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = client_key(&request);

    if !state.rate_governor.allow(&key) {
        log::debug!("rate limited caller {key}");
        let retry_after = state.rate_governor.retry_after().as_secs();

        let body = Json(json!({
            "success": false,
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests, please try again later.",
            },
        }));
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(request).await
}
