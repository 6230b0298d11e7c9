//! Error types for thumbtrack-store

use thumbtrack_core::{PinId, UserId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid snapshot path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
