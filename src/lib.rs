//! Firebird session library.
//!
//! This library builds Firebird connection strings, tracks named transactions,
//! binds typed parameters into statements and procedure calls, and materializes
//! result cursors into ordered, string-keyed rows. SQL execution itself is
//! delegated to a driver implementing the traits in [`db::driver`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::{Config, ConnectionSettings};
pub use db::Session;
pub use error::{DriverError, FbError, FbResult, SqlError};
