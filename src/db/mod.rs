//! Database session layer.
//!
//! This module provides the Firebird mapping layer:
//! - Driver seam (connection, statement and cursor traits)
//! - Connection string and driver property construction
//! - Parameter binding and result materialization
//! - Transaction registry for named connection handles
//! - Statement execution and the caller-facing session API

pub mod connection_string;
pub mod driver;
pub mod executor;
pub mod params;
pub mod session;
pub mod sql;
pub mod transaction_registry;
pub mod types;

pub use connection_string::{ConnectionProperties, build_connection_string};
pub use driver::{
    BatchOutcome, Binding, ColumnDescriptor, Connection, Cursor, Driver, Statement, StatementKind,
};
pub use executor::QueryExecutor;
pub use params::BLOB_STRING_THRESHOLD;
pub use session::Session;
pub use transaction_registry::TransactionRegistry;
