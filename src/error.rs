//! Error types for the Firebird session layer.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Driver diagnostics arrive as an ordered chain of [`SqlError`] entries and are
//! normalized into a single [`FbError::Driver`] value at the operation boundary.

use thiserror::Error;

/// A single diagnostic reported by the underlying driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("#{code}# {message} (SQL State: {})", sql_state.as_deref().unwrap_or("null"))]
pub struct SqlError {
    /// Vendor error code (Firebird GDS code or 0 when unknown)
    pub code: i32,
    /// e.g., "40001" for a lock conflict
    pub sql_state: Option<String>,
    pub message: String,
}

impl SqlError {
    pub fn new(code: i32, sql_state: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code,
            sql_state: sql_state.map(String::from),
            message: message.into(),
        }
    }
}

/// An ordered, non-empty chain of driver diagnostics.
///
/// Drivers return this from every fallible call. The first entry is the
/// primary failure; later entries are the follow-up diagnostics the driver
/// attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    errors: Vec<SqlError>,
}

impl DriverError {
    /// Create a driver error from a single diagnostic.
    pub fn new(code: i32, sql_state: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![SqlError::new(code, sql_state, message)],
        }
    }

    /// Append a follow-up diagnostic to the chain.
    pub fn chain(mut self, next: SqlError) -> Self {
        self.errors.push(next);
        self
    }

    /// Append every diagnostic of another chain.
    pub fn merge(mut self, other: DriverError) -> Self {
        self.errors.extend(other.errors);
        self
    }

    /// The primary diagnostic.
    pub fn primary(&self) -> &SqlError {
        &self.errors[0]
    }

    pub fn errors(&self) -> &[SqlError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<SqlError> {
        self.errors
    }
}

impl From<SqlError> for DriverError {
    fn from(err: SqlError) -> Self {
        Self { errors: vec![err] }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render_chain(&self.errors))
    }
}

impl std::error::Error for DriverError {}

/// Result type alias for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Error, Debug)]
pub enum FbError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid transaction identifier (empty)")]
    InvalidIdentifier,

    #[error("Invalid or inactive transaction: {transaction_id}")]
    InvalidOrInactiveTransaction { transaction_id: String },

    #[error("Connection already open: {transaction_id}")]
    AlreadyOpen { transaction_id: String },

    #[error("Transaction already started: {transaction_id}")]
    AlreadyStarted { transaction_id: String },

    #[error("Invalid parameter type: [{name}] of type: {type_name}")]
    UnsupportedParameterType { name: String, type_name: String },

    #[error("{message}")]
    Driver {
        message: String,
        code: i32,
        sql_state: Option<String>,
        causes: Vec<SqlError>,
        /// Failures from the cleanup that followed the primary error
        secondary: Vec<SqlError>,
    },
}

impl FbError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid or inactive transaction error.
    pub fn inactive(transaction_id: impl Into<String>) -> Self {
        Self::InvalidOrInactiveTransaction {
            transaction_id: transaction_id.into(),
        }
    }

    /// Create an already open error for the default identifier.
    pub fn already_open(transaction_id: impl Into<String>) -> Self {
        Self::AlreadyOpen {
            transaction_id: transaction_id.into(),
        }
    }

    /// Create an already started error.
    pub fn already_started(transaction_id: impl Into<String>) -> Self {
        Self::AlreadyStarted {
            transaction_id: transaction_id.into(),
        }
    }

    /// Create an unsupported parameter type error.
    pub fn unsupported_parameter(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnsupportedParameterType {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Aggregate several driver failures into one error, preserving order.
    ///
    /// Returns `None` when nothing failed.
    pub fn aggregate(failures: Vec<DriverError>) -> Option<Self> {
        let causes: Vec<SqlError> = failures
            .into_iter()
            .flat_map(DriverError::into_errors)
            .collect();
        let first = causes.first()?.clone();
        Some(Self::Driver {
            message: render_chain(&causes),
            code: first.code,
            sql_state: first.sql_state,
            causes,
            secondary: Vec::new(),
        })
    }

    /// Attach cleanup failures to a driver error without replacing it.
    pub fn with_secondary(mut self, extra: Option<DriverError>) -> Self {
        if let (Self::Driver { secondary, .. }, Some(extra)) = (&mut self, extra) {
            secondary.extend(extra.into_errors());
        }
        self
    }

    /// Whether the error originated in the driver.
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    /// Vendor code of the primary driver diagnostic.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Driver { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// SQL state of the primary driver diagnostic.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Driver { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// All driver diagnostics carried by this error, primary chain first.
    pub fn causes(&self) -> &[SqlError] {
        match self {
            Self::Driver { causes, .. } => causes,
            _ => &[],
        }
    }

    pub fn secondary(&self) -> &[SqlError] {
        match self {
            Self::Driver { secondary, .. } => secondary,
            _ => &[],
        }
    }
}

/// Convert a driver error chain to FbError.
impl From<DriverError> for FbError {
    fn from(err: DriverError) -> Self {
        let first = err.primary().clone();
        let causes = err.into_errors();
        Self::Driver {
            message: render_chain(&causes),
            code: first.code,
            sql_state: first.sql_state,
            causes,
            secondary: Vec::new(),
        }
    }
}

/// Result type alias for session operations.
pub type FbResult<T> = Result<T, FbError>;

fn render_chain(errors: &[SqlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_error_display() {
        let err = SqlError::new(335544345, Some("40001"), "lock conflict on no wait transaction");
        assert_eq!(
            err.to_string(),
            "#335544345# lock conflict on no wait transaction (SQL State: 40001)"
        );
    }

    #[test]
    fn test_sql_error_display_without_state() {
        let err = SqlError::new(0, None, "boom");
        assert_eq!(err.to_string(), "#0# boom (SQL State: null)");
    }

    #[test]
    fn test_driver_error_chain_message() {
        let err = DriverError::new(335544569, Some("42000"), "Dynamic SQL Error")
            .chain(SqlError::new(335544634, Some("42000"), "Token unknown"));
        let fb: FbError = err.into();
        assert_eq!(
            fb.to_string(),
            "#335544569# Dynamic SQL Error (SQL State: 42000)\n\
             #335544634# Token unknown (SQL State: 42000)"
        );
        assert_eq!(fb.code(), Some(335544569));
        assert_eq!(fb.sql_state(), Some("42000"));
        assert_eq!(fb.causes().len(), 2);
    }

    #[test]
    fn test_with_secondary_keeps_primary() {
        let primary: FbError = DriverError::new(1, Some("HY000"), "primary").into();
        let fb = primary.with_secondary(Some(DriverError::new(2, None, "rollback failed")));
        assert_eq!(fb.code(), Some(1));
        assert!(fb.to_string().contains("primary"));
        assert_eq!(fb.secondary().len(), 1);
        assert_eq!(fb.secondary()[0].message, "rollback failed");
    }

    #[test]
    fn test_with_secondary_ignores_non_driver() {
        let fb =
            FbError::invalid_argument("x").with_secondary(Some(DriverError::new(2, None, "y")));
        assert!(fb.secondary().is_empty());
        assert!(!fb.is_driver());
    }

    #[test]
    fn test_aggregate() {
        assert!(FbError::aggregate(Vec::new()).is_none());

        let fb = FbError::aggregate(vec![
            DriverError::new(10, Some("08003"), "first"),
            DriverError::new(20, None, "second"),
        ])
        .unwrap();
        assert_eq!(fb.code(), Some(10));
        assert_eq!(fb.causes().len(), 2);
        assert!(fb.to_string().ends_with("#20# second (SQL State: null)"));
    }

    #[test]
    fn test_unsupported_parameter_display() {
        let err = FbError::unsupported_parameter("tags", "array");
        assert_eq!(err.to_string(), "Invalid parameter type: [tags] of type: array");
    }
}
