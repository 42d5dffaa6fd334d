pub mod claims;
pub mod data_stores;

pub use claims::*;
pub use data_stores::*;
