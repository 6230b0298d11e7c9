//! Thumbtrack Server - JSON-RPC front for search and recommendations
//!
//! This crate provides:
//! - `ServerConfig`: bind address, index directory and snapshot file
//! - `RpcHandler`: parameter validation and error mapping over the core services
//! - `ThumbtrackServer` and `run_server`: startup, index probe and shutdown

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use config::*;
pub use error::*;
pub use handler::*;
pub use server::*;
