use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Token failure taxonomy. Variants stay distinguishable because callers
/// react differently: `Expired` prompts a refresh, `Revoked`/`Invalid` force
/// re-authentication, `BadSignature` is a tamper signal worth logging, and
/// `Unavailable` is retryable. Messages stay generic so no signing material,
/// claim contents or store internals reach a response body.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token not valid yet")]
    NotYetValid,

    #[error("token claims do not match this authority")]
    ClaimMismatch,

    #[error("token has been revoked")]
    Revoked,

    #[error("invalid token")]
    Invalid,

    #[error("token store unavailable, please try again later")]
    Unavailable,
}

impl AuthError {
    /// Short machine-readable code included in error bodies so clients can
    /// branch without string matching.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Malformed => "TOKEN_MALFORMED",
            AuthError::BadSignature => "TOKEN_INVALID",
            AuthError::Expired => "TOKEN_EXPIRED",
            AuthError::NotYetValid => "TOKEN_INVALID",
            AuthError::ClaimMismatch => "TOKEN_INVALID",
            AuthError::Revoked => "TOKEN_REVOKED",
            AuthError::Invalid => "TOKEN_INVALID",
            AuthError::Unavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AuthError::Malformed => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            },
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_maps_to_unauthorized() {
        let resp = AuthError::Expired.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn malformed_maps_to_unprocessable() {
        let resp = AuthError::Malformed.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn unavailable_maps_to_service_unavailable() {
        let resp = AuthError::Unavailable.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
