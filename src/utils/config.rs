use std::env;

use base64::engine::general_purpose::{STANDARD as B64_STD, URL_SAFE_NO_PAD as B64_URL};
use base64::Engine;
use dotenvy::dotenv;
use thiserror::Error;

/// Everything a single token authority needs, passed explicitly at
/// construction. Each authority owns its own copy, so several independently
/// keyed authorities can coexist in one process (key rotation, tests).
#[derive(Clone)]
pub struct AuthConfig {
    issuer: String,
    audience: String,
    secret: Vec<u8>,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    leeway_seconds: u64,
    fail_open_verify: bool,
    revoke_sessions_on_reuse: bool,
}

const DEFAULT_LEEWAY_SECONDS: u64 = 5;

impl AuthConfig {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: Vec<u8>,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Result<Self, ConfigError> {
        let cfg = Self {
            issuer: issuer.into(),
            audience: audience.into(),
            secret,
            access_ttl_seconds,
            refresh_ttl_seconds,
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            fail_open_verify: false,
            revoke_sessions_on_reuse: false,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from the environment (reads `.env` first in dev; a no-op when
    /// the file is absent).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();

        let issuer = req_var("JWT_ISSUER")?;
        let audience = req_var("JWT_AUDIENCE")?;

        let secret_b64 = req_var("JWT_SECRET_B64")?;
        let secret =
            decode_b64_any(&secret_b64).map_err(|_| ConfigError::Decode("JWT_SECRET_B64"))?;

        let access_ttl_seconds = parse_i64("ACCESS_TTL_SECONDS")?;
        let refresh_ttl_seconds = parse_i64("REFRESH_TTL_SECONDS")?;

        let leeway_seconds = match opt_var("TOKEN_LEEWAY_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("TOKEN_LEEWAY_SECONDS"))?,
            None => DEFAULT_LEEWAY_SECONDS,
        };

        let fail_open_verify = parse_bool("FAIL_OPEN_VERIFY")?;
        let revoke_sessions_on_reuse = parse_bool("REVOKE_SESSIONS_ON_REUSE")?;

        let cfg = Self {
            issuer,
            audience,
            secret,
            access_ttl_seconds,
            refresh_ttl_seconds,
            leeway_seconds,
            fail_open_verify,
            revoke_sessions_on_reuse,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // HS256 secrets shorter than the hash output are brute-forceable.
        if self.secret.len() < 32 {
            return Err(ConfigError::WrongLen(
                "signing secret must be at least 32 bytes",
            ));
        }
        if self.issuer.is_empty() || self.audience.is_empty() {
            return Err(ConfigError::Invalid("issuer and audience must be set"));
        }
        if self.access_ttl_seconds <= 0 || self.refresh_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("token TTLs must be positive"));
        }
        if self.access_ttl_seconds >= self.refresh_ttl_seconds {
            return Err(ConfigError::Invalid(
                "access TTL must be shorter than refresh TTL",
            ));
        }
        Ok(())
    }

    pub fn with_leeway_seconds(mut self, leeway_seconds: u64) -> Self {
        self.leeway_seconds = leeway_seconds;
        self
    }

    pub fn with_fail_open_verify(mut self, fail_open: bool) -> Self {
        self.fail_open_verify = fail_open;
        self
    }

    pub fn with_revoke_sessions_on_reuse(mut self, revoke: bool) -> Self {
        self.revoke_sessions_on_reuse = revoke;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
    pub fn audience(&self) -> &str {
        &self.audience
    }
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }
    pub fn leeway_seconds(&self) -> u64 {
        self.leeway_seconds
    }
    pub fn fail_open_verify(&self) -> bool {
        self.fail_open_verify
    }
    pub fn revoke_sessions_on_reuse(&self) -> bool {
        self.revoke_sessions_on_reuse
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing env var {0}")]
    Missing(&'static str),
    #[error("invalid env var {0}")]
    Invalid(&'static str),
    #[error("decode error in {0}")]
    Decode(&'static str),
    #[error("{0}")]
    WrongLen(&'static str),
}

fn req_var(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn opt_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn parse_i64(key: &'static str) -> Result<i64, ConfigError> {
    let v = req_var(key)?;
    v.parse::<i64>().map_err(|_| ConfigError::Invalid(key))
}

fn parse_bool(key: &'static str) -> Result<bool, ConfigError> {
    match opt_var(key) {
        None => Ok(false),
        Some(v) => v.parse::<bool>().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn decode_b64_any(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    // Try URL-safe (no padding) first, then standard.
    B64_URL.decode(s).or_else(|_| B64_STD.decode(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Vec<u8> {
        vec![7u8; 32]
    }

    #[test]
    fn valid_config_builds() {
        let cfg = AuthConfig::new("board-api", "api.example.com", secret(), 900, 604800);
        assert!(cfg.is_ok());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.leeway_seconds(), 5);
        assert!(!cfg.fail_open_verify());
    }

    #[test]
    fn short_secret_is_rejected() {
        let cfg = AuthConfig::new("board-api", "api.example.com", vec![0u8; 16], 900, 604800);
        assert!(matches!(cfg, Err(ConfigError::WrongLen(_))));
    }

    #[test]
    fn access_ttl_must_undercut_refresh_ttl() {
        let cfg = AuthConfig::new("board-api", "api.example.com", secret(), 604800, 900);
        assert!(matches!(cfg, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let cfg = AuthConfig::new("board-api", "api.example.com", secret(), 0, 604800);
        assert!(matches!(cfg, Err(ConfigError::Invalid(_))));
    }
}
