pub mod data_stores;
pub mod rate_governor;
pub mod token_codec;
pub mod token_service;

pub use data_stores::{HashmapRevocationStore, RedisRevocationStore, RedisService};
pub use rate_governor::RateGovernor;
pub use token_codec::TokenCodec;
pub use token_service::TokenService;
