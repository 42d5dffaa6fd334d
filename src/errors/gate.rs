use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

use super::AuthError;

/// Failures raised by the request gate before or instead of token
/// validation proper.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("missing authorization token")]
    MissingToken,

    #[error("invalid authorization format")]
    InvalidFormat,

    #[error(transparent)]
    Token(#[from] AuthError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> axum::response::Response {
        match self {
            GateError::MissingToken | GateError::InvalidFormat => {
                let body = Json(json!({
                    "success": false,
                    "error": {
                        "code": "UNAUTHORIZED",
                        "message": self.to_string(),
                    },
                }));
                (StatusCode::UNAUTHORIZED, body).into_response()
            }
            GateError::Token(e) => e.into_response(),
        }
    }
}
