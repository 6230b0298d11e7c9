//! Thumbtrack Client - Client library for connecting to Thumbtrack servers
//!
//! This crate provides:
//! - JSON-RPC client over HTTP
//! - Typed calls for search, feeds and pin lifecycle
//! - Server error codes decoded back into `RpcError`

pub mod client;
pub mod error;

pub use client::*;
pub use error::*;
