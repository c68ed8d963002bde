//! Shelf application library
//!
//! Book catalogue modules plus the bootstrap that wires them to the
//! database and HTTP server.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{check_database, run};
