//! Thumbtrack RPC - JSON-RPC protocol definitions
//!
//! This crate defines:
//! - Request/response types for search, feeds and pin lifecycle
//! - The `ThumbtrackApi` server and client traits
//! - Error codes shared by server and client

pub mod error;
pub mod methods;
pub mod types;

pub use error::*;
pub use methods::*;
pub use types::*;
