use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevocationStoreErr {
    #[error("error while connecting to store: {0}")]
    Connection(String),

    #[error("error while performing store operation: {0}")]
    Operation(String),
}
