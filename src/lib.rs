//! Search service over healthcare-plan operator records.
//!
//! A delimited data file is loaded once into an immutable [`table::Table`]
//! and queried with case-insensitive substring matching via
//! [`search::search`], either from the CLI or over HTTP.

pub mod cli;
pub mod logging;
pub mod models;
pub mod search;
pub mod server;
pub mod table;
