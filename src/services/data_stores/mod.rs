pub mod hashmap_revocation_store;
pub mod redis_revocation_store;
pub mod redis_service;

pub use hashmap_revocation_store::HashmapRevocationStore;
pub use redis_revocation_store::RedisRevocationStore;
pub use redis_service::RedisService;
