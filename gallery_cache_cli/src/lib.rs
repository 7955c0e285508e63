//! Gallery cache command line interface
//!
//! Inspection and maintenance of a file-backed gallery cache store.

pub mod cache;
pub mod config;
pub mod output;
pub mod paths;
pub mod terminal;
