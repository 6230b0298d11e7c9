//! Thumbtrack Search - Pin search over an inverted index with a relational fallback
//!
//! This crate provides:
//! - `IndexHealth`: the process-wide index availability flag, set once at startup
//! - `IndexStore`: the Tantivy-backed searchable projection of pins
//! - `FallbackEngine`: the same read contract served straight from the store
//! - `SearchFacade`: picks a backend per call and hydrates hits in relevance order
//! - `PinLifecycle` and `reindex_all`: keep the projection in step with the store

pub mod error;
pub mod facade;
pub mod fallback;
pub mod health;
pub mod index;
pub mod lifecycle;
pub mod schema;

pub use error::*;
pub use facade::*;
pub use fallback::*;
pub use health::*;
pub use index::*;
pub use lifecycle::*;
pub use schema::*;
