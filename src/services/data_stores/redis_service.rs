use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Script, SetExpiry, SetOptions};
use std::error::Error;
use std::fmt;

// Common seconds type for Redis expirations
type Seconds = i64;

// Small helper to shorten CRUD error mapping
fn crud<E: ToString>(e: E) -> RedisServiceErr {
    RedisServiceErr::CRUDErr(e.to_string())
}

#[derive(Debug)]
pub enum RedisServiceErr {
    ConnectionErr(String),
    CRUDErr(String),
}

impl fmt::Display for RedisServiceErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedisServiceErr::ConnectionErr(str) => {
                write!(f, "error while connecting to instance: {str}")
            }
            RedisServiceErr::CRUDErr(str) => write!(f, "error while performing CRUD action: {str}"),
        }
    }
}

impl Error for RedisServiceErr {}

/// Thin async wrapper around the Redis commands the revocation store needs:
/// SET-with-expiry, GET, EXISTS, DEL and a scripted compare-and-swap.
pub struct RedisService {
    client: Client,
}

// Single transaction: install ARGV[2] only if the stored value equals
// ARGV[1]. Runs atomically server-side, which is what keeps concurrent
// refresh rotations linearizable.
const CAS_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if current == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', tonumber(ARGV[3]))
    return 1
end
return 0
"#;

impl RedisService {
    pub fn new(host_url: &str) -> Result<Self, RedisServiceErr> {
        let formatted_url = format!("redis://{}/", host_url);
        let client = Client::open(formatted_url)
            .map_err(|e| RedisServiceErr::ConnectionErr(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, RedisServiceErr> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisServiceErr::ConnectionErr(e.to_string()))
    }

    pub async fn set_key_value(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Seconds,
    ) -> Result<(), RedisServiceErr> {
        // Clamp TTL to at least 1 second to avoid immediate expiration
        let ttl_seconds = ttl_seconds.max(1);
        let mut conn = self.get_connection().await?;
        let opts = SetOptions::default().with_expiration(SetExpiry::EX(ttl_seconds as u64));
        conn.set_options::<_, _, ()>(key, value, opts)
            .await
            .map_err(crud)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, RedisServiceErr> {
        let mut conn = self.get_connection().await?;
        conn.get(key).await.map_err(crud)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, RedisServiceErr> {
        let mut conn = self.get_connection().await?;
        conn.exists(key).await.map_err(crud)
    }

    pub async fn delete_key(&self, key: &str) -> Result<bool, RedisServiceErr> {
        let mut conn = self.get_connection().await?;
        let deleted: i32 = conn.del(key).await.map_err(crud)?;
        Ok(deleted > 0)
    }

    /// Atomically replace `key`'s value with `new_value` (expiring after
    /// `ttl_seconds`) if and only if it currently equals `expected`.
    pub async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new_value: &str,
        ttl_seconds: Seconds,
    ) -> Result<bool, RedisServiceErr> {
        let ttl_seconds = ttl_seconds.max(1);
        let mut conn = self.get_connection().await?;
        let swapped: i32 = Script::new(CAS_SCRIPT)
            .key(key)
            .arg(expected)
            .arg(new_value)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(crud)?;
        Ok(swapped == 1)
    }
}
