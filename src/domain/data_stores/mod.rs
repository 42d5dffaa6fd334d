pub mod revocation_store;
pub mod revocation_store_err;

pub use revocation_store::*;
pub use revocation_store_err::*;
