use std::sync::Arc;

use crate::services::{RateGovernor, TokenService};

// Using type aliases to improve readability!
pub type TokenServiceType = Arc<TokenService>;
pub type RateGovernorType = Arc<RateGovernor>;

/// Shared state handed to the middleware layer by the API's router.
#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenServiceType,
    pub rate_governor: RateGovernorType,
}

impl AppState {
    pub fn new(token_service: TokenServiceType, rate_governor: RateGovernorType) -> Self {
        Self {
            token_service,
            rate_governor,
        }
    }
}
