//! Data models for Firebird sessions.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{ConnectionType, TransactionInfo};
pub use query::{ParamValue, Parameter, ParameterList, ResultSet, Row};
