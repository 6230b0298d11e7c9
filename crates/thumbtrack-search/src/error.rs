//! Error types for thumbtrack-search

use thumbtrack_core::{CoreError, PinId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Index task failed: {0}")]
    Task(String),

    #[error("Invalid input: {0}")]
    Invalid(#[from] CoreError),

    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(#[from] thumbtrack_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
