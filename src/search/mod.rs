//! Core search engine module.
//!
//! This module hosts the linear-scan `search` over a loaded table and
//! the error type shared by the CLI and the HTTP server.

pub mod engine;

pub use engine::{search, SearchError};
