//! Error types for thumbtrack-server

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] thumbtrack_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
