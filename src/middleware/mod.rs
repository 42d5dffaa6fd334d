pub mod auth_gate;
pub mod rate_limit;

pub use auth_gate::{current_user, current_user_id, optional_auth, require_auth};
pub use rate_limit::rate_limit;
