use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed role set carried inside access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Payload of an access token: identity/profile claims plus the registered
/// JWT claims. `sub` is the stringified `user_id`; `jti` is a random 128-bit
/// hex id used for blacklist lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: u64,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
    pub jti: String,
}

/// Payload of a refresh token. Registered claims only: no profile data, and
/// no audience because refresh tokens are exchanged, not presented to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
    pub jti: String,
}

/// Login / rotation response payload. `expires_in` lets clients schedule a
/// proactive refresh before the access token lapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
