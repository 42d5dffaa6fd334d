use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::data_stores::{RevocationStore, RevocationStoreErr};

#[derive(Default)]
struct Inner {
    // token id -> entry expiry
    blacklist: HashMap<String, DateTime<Utc>>,
    // user id -> (current refresh id, entry expiry)
    current: HashMap<u64, (String, DateTime<Utc>)>,
}

/// In-memory reference implementation. Expiry is checked lazily on every
/// read and compacted by `purge_expired`, so TTL semantics match a real
/// key-value backend closely enough for tests and single-node deployments.
///
/// All trait methods take one lock for their whole read-modify-write, which
/// is what makes `swap_current_token_id` atomic here.
#[derive(Default)]
pub struct HashmapRevocationStore {
    inner: Mutex<Inner>,
}

impl HashmapRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose TTL has elapsed. Safe to run any time; nothing
    /// still-valid can reference them.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("revocation store lock poisoned");
        inner.blacklist.retain(|_, expires_at| *expires_at > now);
        inner.current.retain(|_, (_, expires_at)| *expires_at > now);
    }

    pub fn blacklist_len(&self) -> usize {
        self.inner
            .lock()
            .expect("revocation store lock poisoned")
            .blacklist
            .len()
    }
}

fn deadline(ttl: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero())
}

#[async_trait::async_trait]
impl RevocationStore for HashmapRevocationStore {
    async fn add_to_blacklist(
        &self,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), RevocationStoreErr> {
        let mut inner = self.inner.lock().expect("revocation store lock poisoned");
        inner.blacklist.insert(token_id.to_owned(), deadline(ttl));
        Ok(())
    }

    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        let inner = self.inner.lock().expect("revocation store lock poisoned");
        Ok(matches!(inner.blacklist.get(token_id), Some(expires_at) if *expires_at > Utc::now()))
    }

    async fn get_current_token_id(
        &self,
        user_id: u64,
    ) -> Result<Option<String>, RevocationStoreErr> {
        let inner = self.inner.lock().expect("revocation store lock poisoned");
        let now = Utc::now();
        Ok(inner.current.get(&user_id).and_then(|(id, expires_at)| {
            if *expires_at > now {
                Some(id.clone())
            } else {
                None
            }
        }))
    }

    async fn set_current_token_id(
        &self,
        user_id: u64,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), RevocationStoreErr> {
        let mut inner = self.inner.lock().expect("revocation store lock poisoned");
        inner
            .current
            .insert(user_id, (token_id.to_owned(), deadline(ttl)));
        Ok(())
    }

    async fn swap_current_token_id(
        &self,
        user_id: u64,
        expected: &str,
        new_token_id: &str,
        ttl: Duration,
    ) -> Result<bool, RevocationStoreErr> {
        let mut inner = self.inner.lock().expect("revocation store lock poisoned");
        let now = Utc::now();

        let matches = matches!(
            inner.current.get(&user_id),
            Some((id, expires_at)) if id.as_str() == expected && *expires_at > now
        );
        if !matches {
            return Ok(false);
        }

        inner
            .current
            .insert(user_id, (new_token_id.to_owned(), deadline(ttl)));
        Ok(true)
    }

    async fn clear_current_token_id(&self, user_id: u64) -> Result<(), RevocationStoreErr> {
        let mut inner = self.inner.lock().expect("revocation store lock poisoned");
        inner.current.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blacklist_entry_expires_with_ttl() {
        let store = HashmapRevocationStore::new();
        store
            .add_to_blacklist("live", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .add_to_blacklist("dead", Duration::from_secs(0))
            .await
            .unwrap();

        assert!(store.is_blacklisted("live").await.unwrap());
        assert!(!store.is_blacklisted("dead").await.unwrap());
        assert!(!store.is_blacklisted("never-seen").await.unwrap());
    }

    #[tokio::test]
    async fn purge_drops_expired_entries() {
        let store = HashmapRevocationStore::new();
        store
            .add_to_blacklist("live", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .add_to_blacklist("dead", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.blacklist_len(), 2);

        store.purge_expired();
        assert_eq!(store.blacklist_len(), 1);
        assert!(store.is_blacklisted("live").await.unwrap());
    }

    #[tokio::test]
    async fn swap_succeeds_only_on_matching_id() {
        let store = HashmapRevocationStore::new();
        let ttl = Duration::from_secs(60);
        store.set_current_token_id(42, "first", ttl).await.unwrap();

        assert!(store
            .swap_current_token_id(42, "first", "second", ttl)
            .await
            .unwrap());
        assert_eq!(
            store.get_current_token_id(42).await.unwrap().as_deref(),
            Some("second")
        );

        // The old id no longer matches "current".
        assert!(!store
            .swap_current_token_id(42, "first", "third", ttl)
            .await
            .unwrap());
        assert_eq!(
            store.get_current_token_id(42).await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn swap_fails_for_unknown_user() {
        let store = HashmapRevocationStore::new();
        assert!(!store
            .swap_current_token_id(7, "anything", "new", Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn clear_removes_current_id() {
        let store = HashmapRevocationStore::new();
        let ttl = Duration::from_secs(60);
        store.set_current_token_id(42, "first", ttl).await.unwrap();
        store.clear_current_token_id(42).await.unwrap();
        assert_eq!(store.get_current_token_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_current_id_reads_as_absent() {
        let store = HashmapRevocationStore::new();
        store
            .set_current_token_id(42, "stale", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.get_current_token_id(42).await.unwrap(), None);
        assert!(!store
            .swap_current_token_id(42, "stale", "new", Duration::from_secs(60))
            .await
            .unwrap());
    }
}
