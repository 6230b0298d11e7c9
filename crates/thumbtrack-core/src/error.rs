//! Error types for thumbtrack-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid page: {0} (pages start at 1)")]
    InvalidPage(i64),

    #[error("Invalid pin: {0}")]
    InvalidPin(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
