//! Authentication core for the board API.
//!
//! This crate owns everything with real security weight in the service:
//! - signing and validating access / refresh JWTs ([`services::TokenCodec`])
//! - issuance, verification, rotation and revocation flows
//!   ([`services::TokenService`])
//! - the revocation store contract plus in-memory and Redis-backed
//!   implementations ([`domain::data_stores`])
//! - a per-IP token-bucket rate governor ([`services::RateGovernor`])
//! - the thin axum middleware that wires the above into a router
//!   ([`middleware`])
//!
//! The surrounding CRUD handlers, persistence and routing live in the API
//! crate and only consume the types re-exported here.

pub mod app_state;
pub mod domain;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod utils;

pub use app_state::AppState;
pub use domain::{AccessClaims, RefreshClaims, Role, TokenPair};
pub use errors::AuthError;
pub use services::{RateGovernor, TokenCodec, TokenService};
pub use utils::config::AuthConfig;
