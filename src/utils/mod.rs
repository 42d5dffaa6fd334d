pub mod config;

pub use config::{AuthConfig, ConfigError};
