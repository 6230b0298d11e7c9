//! Thumbtrack Store - Access to the relational source of truth
//!
//! This crate provides:
//! - The `PinStore` trait: every query the search and feed engines issue
//! - `MemoryStore`, an in-process implementation with JSON snapshots

pub mod error;
pub mod memory;
pub mod store;

pub use error::*;
pub use memory::*;
pub use store::*;
