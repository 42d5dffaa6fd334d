//! Token issuance, verification, rotation and revocation.
//!
//! Security model:
//! 1. Access tokens are short-lived and verified statelessly; the only store
//!    round trip on the hot path is the optional blacklist check.
//! 2. Exactly one refresh-token id is valid per user at any time. Rotation
//!    installs the successor id with a compare-and-swap, so a replayed or
//!    stolen refresh token loses the race and fails with `Invalid`.
//! 3. Explicit revocation blacklists an access token's id for its remaining
//!    lifetime; after natural expiry the entry self-expires.
//!
//! The service returns typed errors and never logs or shapes HTTP responses;
//! that is the request gate's job.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    token_fingerprint, AccessClaims, RefreshClaims, RevocationStore, Role, TokenPair,
};
use crate::errors::AuthError;
use crate::services::token_codec::TokenCodec;
use crate::utils::config::AuthConfig;

/// Façade for the token lifecycle. Owns the codec and its key material;
/// borrows the revocation store, which is shared with the rest of the app.
///
/// The store is optional: without one, verification is purely stateless
/// (no blacklist) and rotation is refused, since nothing would guard replay.
#[derive(Clone)]
pub struct TokenService {
    codec: TokenCodec,
    config: AuthConfig,
    store: Option<Arc<dyn RevocationStore>>,
}

impl TokenService {
    pub fn new(config: AuthConfig, store: Option<Arc<dyn RevocationStore>>) -> Self {
        let codec = TokenCodec::new(&config);
        Self {
            codec,
            config,
            store,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Access-token TTL in seconds, exposed for `expires_in` response fields.
    pub fn access_expiry_seconds(&self) -> i64 {
        self.config.access_ttl_seconds()
    }

    fn new_token_id() -> String {
        // 128 random bits, hex encoded.
        Uuid::new_v4().simple().to_string()
    }

    /// Build and sign a short-lived access token. Pure function of the
    /// inputs plus clock and randomness; no store interaction.
    pub fn issue_access_token(
        &self,
        user_id: u64,
        email: &str,
        username: &str,
        role: Role,
    ) -> Result<String, AuthError> {
        if user_id == 0 {
            return Err(AuthError::Invalid);
        }

        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            user_id,
            email: email.to_owned(),
            username: username.to_owned(),
            role,
            iss: self.codec.issuer().to_owned(),
            sub: user_id.to_string(),
            aud: self.codec.audience().to_owned(),
            exp: (now + self.config.access_ttl_seconds()) as usize,
            iat: now as usize,
            nbf: now as usize,
            jti: Self::new_token_id(),
        };

        self.codec.encode_access(&claims)
    }

    fn build_refresh_token(&self, user_id: u64, token_id: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            iss: self.codec.issuer().to_owned(),
            sub: user_id.to_string(),
            exp: (now + self.config.refresh_ttl_seconds()) as usize,
            iat: now as usize,
            nbf: now as usize,
            jti: token_id.to_owned(),
        };
        self.codec.encode_refresh(&claims)
    }

    /// Sign a refresh token and record its id as the user's current one.
    pub async fn issue_refresh_token(&self, user_id: u64) -> Result<String, AuthError> {
        if user_id == 0 {
            return Err(AuthError::Invalid);
        }

        let token_id = Self::new_token_id();
        let token = self.build_refresh_token(user_id, &token_id)?;

        if let Some(store) = &self.store {
            store
                .set_current_token_id(user_id, &token_id, self.refresh_ttl())
                .await
                .map_err(|_| AuthError::Unavailable)?;
        }

        Ok(token)
    }

    /// Login entry point: a fresh access + refresh pair.
    pub async fn issue_token_pair(
        &self,
        user_id: u64,
        email: &str,
        username: &str,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        let access = self.issue_access_token(user_id, email, username, role)?;
        let refresh = self.issue_refresh_token(user_id).await?;
        Ok(TokenPair::new(
            access,
            refresh,
            self.access_expiry_seconds(),
        ))
    }

    /// Validate an access token: signature, algorithm, issuer, audience and
    /// temporal claims via the codec, then the blacklist. A blacklisted id
    /// fails with `Revoked` regardless of expiry state.
    ///
    /// When the store is unreachable the outcome depends on policy: the
    /// default is fail-closed (`Unavailable`); `fail_open_verify` skips the
    /// blacklist check instead, keeping stateless verification alive through
    /// store outages.
    pub async fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims = self.codec.decode_access(token)?;

        if let Some(store) = &self.store {
            match store.is_blacklisted(&claims.jti).await {
                Ok(true) => return Err(AuthError::Revoked),
                Ok(false) => {}
                Err(_) if self.config.fail_open_verify() => {}
                Err(_) => return Err(AuthError::Unavailable),
            }
        }

        Ok(claims)
    }

    /// Validate a refresh token and return the user id it was issued to.
    /// Read-only: the caller uses this to load the user's profile before
    /// committing to a rotation.
    pub async fn verify_refresh_token(&self, token: &str) -> Result<u64, AuthError> {
        let claims = self.codec.decode_refresh(token)?;
        let user_id = parse_subject(&claims.sub)?;

        if let Some(store) = &self.store {
            let current = store
                .get_current_token_id(user_id)
                .await
                .map_err(|_| AuthError::Unavailable)?;
            match current {
                Some(id) if id == claims.jti => {}
                // Superseded by a later rotation, or no session on record.
                _ => return Err(AuthError::Invalid),
            }
        }

        Ok(user_id)
    }

    /// Rotate a refresh token: atomically supersede its id with a fresh one
    /// and mint a new access + refresh pair.
    ///
    /// The swap is a single compare-and-swap against the store, so two
    /// concurrent rotations of the same token produce at most one success;
    /// the loser sees `Invalid`. A mismatch also means the presented token
    /// was already rotated away, which is a replay or theft signal; with
    /// `revoke_sessions_on_reuse` set, the whole session lineage is cleared
    /// on that signal.
    ///
    /// Rotation is fail-closed: it is the sole state mutation guarding
    /// replay, so a missing or unreachable store yields `Unavailable`.
    pub async fn rotate_refresh_token(
        &self,
        token: &str,
        email: &str,
        username: &str,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        let store = self.store.as_ref().ok_or(AuthError::Unavailable)?;

        let claims = self.codec.decode_refresh(token)?;
        let user_id = parse_subject(&claims.sub)?;

        let new_token_id = Self::new_token_id();
        let new_refresh = self.build_refresh_token(user_id, &new_token_id)?;

        let swapped = store
            .swap_current_token_id(user_id, &claims.jti, &new_token_id, self.refresh_ttl())
            .await
            .map_err(|_| AuthError::Unavailable)?;

        if !swapped {
            if self.config.revoke_sessions_on_reuse() {
                let _ = store.clear_current_token_id(user_id).await;
            }
            return Err(AuthError::Invalid);
        }

        let access = self.issue_access_token(user_id, email, username, role)?;
        Ok(TokenPair::new(
            access,
            new_refresh,
            self.access_expiry_seconds(),
        ))
    }

    /// Blacklist an access token's id for its remaining lifetime. Decoding
    /// ignores expiry: an already-expired token is a no-op, since its id
    /// could never pass verification anyway. A token without a `jti` falls
    /// back to a fingerprint of the raw string as the blacklist key.
    pub async fn revoke_access_token(&self, token: &str) -> Result<(), AuthError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let claims = self.codec.decode_access_ignoring_expiry(token)?;

        let remaining = claims.exp as i64 - Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(());
        }

        let key = if claims.jti.is_empty() {
            token_fingerprint(token)
        } else {
            claims.jti
        };

        store
            .add_to_blacklist(&key, Duration::from_secs(remaining as u64))
            .await
            .map_err(|_| AuthError::Unavailable)
    }

    /// Drop the user's current refresh id so every outstanding refresh token
    /// immediately fails rotation. Already-issued unexpired access tokens
    /// stay valid until their TTL runs out; that bound is why the access TTL
    /// is short.
    pub async fn revoke_all_sessions(&self, user_id: u64) -> Result<(), AuthError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        store
            .clear_current_token_id(user_id)
            .await
            .map_err(|_| AuthError::Unavailable)
    }

    fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.config.refresh_ttl_seconds() as u64)
    }
}

fn parse_subject(sub: &str) -> Result<u64, AuthError> {
    let user_id = sub.parse::<u64>().map_err(|_| AuthError::Invalid)?;
    if user_id == 0 {
        return Err(AuthError::Invalid);
    }
    Ok(user_id)
}
