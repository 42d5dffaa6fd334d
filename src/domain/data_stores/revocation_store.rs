use std::time::Duration;

use super::RevocationStoreErr;

/// Out-of-band key-value state consulted by the token service:
/// - a blacklist of explicitly revoked access-token ids, each entry living
///   until the token's natural expiry;
/// - the single currently-valid refresh-token id per user, which rotation
///   replaces and replay checks compare against.
///
/// Implementations must honor TTLs so stale entries self-expire, and
/// `swap_current_token_id` must be atomic: it is the only thing standing
/// between two concurrent rotations of the same stale refresh token and two
/// coexisting successor tokens.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    async fn add_to_blacklist(
        &self,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), RevocationStoreErr>;

    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, RevocationStoreErr>;

    async fn get_current_token_id(
        &self,
        user_id: u64,
    ) -> Result<Option<String>, RevocationStoreErr>;

    async fn set_current_token_id(
        &self,
        user_id: u64,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), RevocationStoreErr>;

    /// Compare-and-swap the current refresh-token id. Returns `true` and
    /// installs `new_token_id` (with `ttl`) only if the stored id equals
    /// `expected`; returns `false` otherwise, leaving the stored id alone.
    async fn swap_current_token_id(
        &self,
        user_id: u64,
        expected: &str,
        new_token_id: &str,
        ttl: Duration,
    ) -> Result<bool, RevocationStoreErr>;

    async fn clear_current_token_id(&self, user_id: u64) -> Result<(), RevocationStoreErr>;
}

/// Deterministic fingerprint of a raw token string, used as the blacklist
/// key when a token carries no `jti`. Truncated to 128 bits to match the
/// size of a real token id.
pub fn token_fingerprint(token: &str) -> String {
    let hash = blake3::hash(token.as_bytes());
    hash.to_hex()[..32].to_string()
}
