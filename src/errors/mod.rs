mod auth;
mod gate;

pub use auth::*;
pub use gate::*;
