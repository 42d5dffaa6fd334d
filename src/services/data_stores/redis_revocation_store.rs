use std::sync::Arc;
use std::time::Duration;

use crate::domain::data_stores::{RevocationStore, RevocationStoreErr};
use crate::services::data_stores::redis_service::{RedisService, RedisServiceErr};

/// Redis-backed revocation state. Blacklist entries and current refresh ids
/// live under separate key prefixes, each with a TTL so Redis garbage
/// collects them at the token's natural expiry.
pub struct RedisRevocationStore {
    redis_service: Arc<RedisService>,
}

impl RedisRevocationStore {
    pub fn new(redis_service: Arc<RedisService>) -> Self {
        Self { redis_service }
    }

    fn blacklist_key(token_id: &str) -> String {
        format!("blacklist:{}", token_id)
    }

    fn current_key(user_id: u64) -> String {
        format!("refresh:current:{}", user_id)
    }
}

fn map_err(e: RedisServiceErr) -> RevocationStoreErr {
    match e {
        RedisServiceErr::ConnectionErr(s) => RevocationStoreErr::Connection(s),
        RedisServiceErr::CRUDErr(s) => RevocationStoreErr::Operation(s),
    }
}

fn ttl_seconds(ttl: Duration) -> i64 {
    ttl.as_secs() as i64
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn add_to_blacklist(
        &self,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), RevocationStoreErr> {
        self.redis_service
            .set_key_value(&Self::blacklist_key(token_id), "1", ttl_seconds(ttl))
            .await
            .map_err(map_err)
    }

    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        self.redis_service
            .exists(&Self::blacklist_key(token_id))
            .await
            .map_err(map_err)
    }

    async fn get_current_token_id(
        &self,
        user_id: u64,
    ) -> Result<Option<String>, RevocationStoreErr> {
        self.redis_service
            .get(&Self::current_key(user_id))
            .await
            .map_err(map_err)
    }

    async fn set_current_token_id(
        &self,
        user_id: u64,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), RevocationStoreErr> {
        self.redis_service
            .set_key_value(&Self::current_key(user_id), token_id, ttl_seconds(ttl))
            .await
            .map_err(map_err)
    }

    async fn swap_current_token_id(
        &self,
        user_id: u64,
        expected: &str,
        new_token_id: &str,
        ttl: Duration,
    ) -> Result<bool, RevocationStoreErr> {
        self.redis_service
            .compare_and_swap(
                &Self::current_key(user_id),
                expected,
                new_token_id,
                ttl_seconds(ttl),
            )
            .await
            .map_err(map_err)
    }

    async fn clear_current_token_id(&self, user_id: u64) -> Result<(), RevocationStoreErr> {
        self.redis_service
            .delete_key(&Self::current_key(user_id))
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
