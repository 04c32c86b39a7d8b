//! Driver seam.
//!
//! The session layer never speaks the Firebird wire protocol itself. Everything
//! below is implemented by the embedding application on top of a concrete client
//! library; this crate only configures and calls it.
//!
//! Positional indices (parameters and columns) are 1-based, matching the
//! placeholder order in the SQL text.

use crate::db::connection_string::ConnectionProperties;
use crate::error::DriverResult;
use std::time::Duration;

/// How a statement is prepared on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Unparameterized text executed as-is
    Plain,
    /// Parameterized statement with `?` placeholders
    Prepared,
    /// Stored procedure call in `{call name(?,...)}` escape syntax
    Call,
}

/// A single typed value handed to the driver for one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<'a> {
    Null,
    Int(i32),
    Long(i64),
    Bool(bool),
    Double(f64),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    Text(&'a str),
    /// Streamed into a blob instead of being sent inline
    BinaryStream(&'a [u8]),
}

impl Binding<'_> {
    /// Name of the bind path taken, for logging and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Bool(_) => "bool",
            Self::Double(_) => "double",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "string",
            Self::BinaryStream(_) => "binary_stream",
        }
    }
}

/// Per-row outcome reported by a batch execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Count(u64),
    /// Succeeded but the driver did not report a row count
    SuccessNoInfo,
    Failed,
}

/// Column metadata exposed by a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared SQL type name, e.g. "INTEGER" or "BLOB SUB_TYPE 1"
    pub type_name: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Entry point of a concrete driver.
pub trait Driver {
    type Connection: Connection + 'static;

    /// Open a connection for the given connection string and property list.
    fn connect(
        &self,
        url: &str,
        properties: &ConnectionProperties,
    ) -> DriverResult<Self::Connection>;
}

/// A live driver connection.
pub trait Connection {
    fn set_auto_commit(&mut self, enabled: bool) -> DriverResult<()>;

    fn is_closed(&self) -> bool;

    /// Prepare a statement. The statement borrows the connection until dropped.
    fn prepare(&mut self, sql: &str, kind: StatementKind) -> DriverResult<Box<dyn Statement + '_>>;

    fn commit(&mut self) -> DriverResult<()>;

    fn rollback(&mut self) -> DriverResult<()>;

    fn close(&mut self) -> DriverResult<()>;

    /// Whether the server reports transaction support.
    fn supports_transactions(&mut self) -> DriverResult<bool>;
}

/// A prepared statement.
pub trait Statement {
    fn set_query_timeout(&mut self, timeout: Duration) -> DriverResult<()>;

    fn bind(&mut self, index: usize, value: Binding<'_>) -> DriverResult<()>;

    /// Mark a procedure call as producing a result set.
    fn mark_selectable(&mut self) -> DriverResult<()> {
        Ok(())
    }

    /// Execute without expecting a result set.
    fn execute(&mut self) -> DriverResult<bool>;

    /// Execute an update and return the affected row count.
    fn execute_update(&mut self) -> DriverResult<u64>;

    fn execute_query(&mut self) -> DriverResult<Box<dyn Cursor + '_>>;

    /// Queue the currently bound values as one batch entry.
    fn add_batch(&mut self) -> DriverResult<()>;

    fn execute_batch(&mut self) -> DriverResult<Vec<BatchOutcome>>;

    fn close(&mut self) -> DriverResult<()>;
}

/// A forward-only result cursor.
pub trait Cursor {
    fn columns(&self) -> DriverResult<Vec<ColumnDescriptor>>;

    /// Move to the next row. Returns `false` once exhausted.
    fn advance(&mut self) -> DriverResult<bool>;

    fn get_int(&mut self, index: usize) -> DriverResult<Option<i32>>;

    fn get_long(&mut self, index: usize) -> DriverResult<Option<i64>>;

    fn get_double(&mut self, index: usize) -> DriverResult<Option<f64>>;

    /// The driver's default string rendering of the column.
    fn get_string(&mut self, index: usize) -> DriverResult<Option<String>>;

    /// Full contents of a blob column, `None` for a null blob reference.
    fn get_blob(&mut self, index: usize) -> DriverResult<Option<Vec<u8>>>;

    fn close(&mut self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_kind() {
        assert_eq!(Binding::Null.kind(), "null");
        assert_eq!(Binding::Long(1).kind(), "long");
        assert_eq!(Binding::Text("a").kind(), "string");
        assert_eq!(Binding::BinaryStream(b"a").kind(), "binary_stream");
    }
}
