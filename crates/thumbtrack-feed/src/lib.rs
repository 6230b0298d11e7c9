//! Thumbtrack Feed - Recommendation feeds built from engagement signals
//!
//! This crate provides:
//! - `FeedConfig`: feed size, signal weights and bounds
//! - `SignalAggregator`: a caller's tag affinities and exclusion set
//! - `FeedEngine`: the for-you, trending and following feeds, and view recording

pub mod config;
pub mod engine;
pub mod error;
pub mod signals;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use signals::*;
