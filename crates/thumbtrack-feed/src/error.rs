//! Error types for thumbtrack-feed

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Store error: {0}")]
    Store(#[from] thumbtrack_store::StoreError),

    #[error("Search error: {0}")]
    Search(#[from] thumbtrack_search::SearchError),
}

pub type Result<T> = std::result::Result<T, FeedError>;
