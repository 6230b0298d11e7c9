//! Thumbtrack Core - Core types shared by the search and recommendation engine
//!
//! This crate defines the data structures used throughout Thumbtrack:
//! - Identifier newtypes (`UserId`, `PinId`, `BoardId`, `CommentId`)
//! - Source-of-truth entities: `Pin`, `User`, `Board`, `SavedPin`, `Follow`, `Comment`
//! - The search projection (`SearchDocument`) and the paginated `SearchResult` envelope

pub mod error;
pub mod ids;
pub mod pin;
pub mod search;
pub mod social;

pub use error::*;
pub use ids::*;
pub use pin::*;
pub use search::*;
pub use social::*;
