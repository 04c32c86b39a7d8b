//! Statement execution engine.
//!
//! This module drives the driver's statement API for every execution path:
//! - Plain updates and selects
//! - Parameterized updates
//! - Batched bulk inserts
//! - Stored procedure calls (executable and selectable)
//!
//! Statements and cursors are scoped: they are closed on every exit path before
//! the result or error leaves this module. Close failures are logged and dropped.

use crate::db::driver::{BatchOutcome, Connection, Cursor, Statement, StatementKind};
use crate::db::params::{bind_parameters, bind_values};
use crate::db::types::materialize;
use crate::error::DriverResult;
use crate::models::{ParamValue, ParameterList, ResultSet};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Statement executor that applies the per-statement timeout.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    query_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Execute an unparameterized update and return affected rows.
    pub fn execute_update(&self, conn: &mut dyn Connection, sql: &str) -> DriverResult<u64> {
        let start = Instant::now();
        debug!(sql = %sql, "Executing update");

        let mut stmt = self.prepare(conn, sql, StatementKind::Plain)?;
        let rows_affected = stmt.execute_update()?;

        debug!(
            rows_affected = rows_affected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Update executed"
        );
        Ok(rows_affected)
    }

    /// Execute an unparameterized query and materialize its rows.
    pub fn execute_select(&self, conn: &mut dyn Connection, sql: &str) -> DriverResult<ResultSet> {
        let start = Instant::now();
        debug!(sql = %sql, "Executing query");

        let mut stmt = self.prepare(conn, sql, StatementKind::Plain)?;
        let mut cursor = CursorScope::new(stmt.execute_query()?);
        let rows = materialize(&mut *cursor)?;

        debug!(
            row_count = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(rows)
    }

    /// Execute a parameterized update and return affected rows.
    pub fn execute_prepared(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        params: &ParameterList,
    ) -> DriverResult<u64> {
        debug!(sql = %sql, params = params.len(), "Executing prepared update");

        let mut stmt = self.prepare(conn, sql, StatementKind::Prepared)?;
        bind_parameters(&mut *stmt, params)?;
        stmt.execute_update()
    }

    /// Bind and batch every row, execute once, and count successful rows.
    ///
    /// Rows reporting success without a row count are counted as successful.
    pub fn execute_batch(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        rows: &[Vec<ParamValue>],
    ) -> DriverResult<u64> {
        debug!(sql = %sql, rows = rows.len(), "Executing batch");

        let mut stmt = self.prepare(conn, sql, StatementKind::Prepared)?;
        for row in rows {
            bind_values(&mut *stmt, row)?;
            stmt.add_batch()?;
        }
        let outcomes = stmt.execute_batch()?;
        let succeeded = count_successful(&outcomes);

        debug!(
            batched = rows.len(),
            succeeded = succeeded,
            "Batch executed"
        );
        Ok(succeeded)
    }

    /// Call a stored procedure without expecting a result set.
    pub fn execute_call(
        &self,
        conn: &mut dyn Connection,
        call: &str,
        params: &ParameterList,
    ) -> DriverResult<bool> {
        debug!(call = %call, params = params.len(), "Executing procedure");

        let mut stmt = self.prepare(conn, call, StatementKind::Call)?;
        bind_parameters(&mut *stmt, params)?;
        stmt.execute()?;
        Ok(true)
    }

    /// Call a selectable stored procedure and materialize its rows.
    pub fn execute_selectable_call(
        &self,
        conn: &mut dyn Connection,
        call: &str,
        params: &ParameterList,
    ) -> DriverResult<ResultSet> {
        debug!(call = %call, params = params.len(), "Executing selectable procedure");

        let mut stmt = self.prepare(conn, call, StatementKind::Call)?;
        bind_parameters(&mut *stmt, params)?;
        stmt.mark_selectable()?;
        let mut cursor = CursorScope::new(stmt.execute_query()?);
        let rows = materialize(&mut *cursor)?;

        debug!(row_count = rows.len(), "Selectable procedure executed");
        Ok(rows)
    }

    fn prepare<'c>(
        &self,
        conn: &'c mut dyn Connection,
        sql: &str,
        kind: StatementKind,
    ) -> DriverResult<StatementScope<'c>> {
        let mut stmt = StatementScope::new(conn.prepare(sql, kind)?);
        stmt.set_query_timeout(self.query_timeout)?;
        Ok(stmt)
    }
}

/// Count batch entries the driver reports as successful.
pub fn count_successful(outcomes: &[BatchOutcome]) -> u64 {
    outcomes
        .iter()
        .filter(|o| match o {
            BatchOutcome::Count(n) => *n > 0,
            BatchOutcome::SuccessNoInfo => true,
            BatchOutcome::Failed => false,
        })
        .count() as u64
}

// =============================================================================
// Scoped Resources
// =============================================================================

/// Closes the statement when dropped.
struct StatementScope<'c> {
    inner: Box<dyn Statement + 'c>,
}

impl<'c> StatementScope<'c> {
    fn new(inner: Box<dyn Statement + 'c>) -> Self {
        Self { inner }
    }
}

impl<'c> Deref for StatementScope<'c> {
    type Target = dyn Statement + 'c;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DerefMut for StatementScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.inner
    }
}

impl Drop for StatementScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.inner.close() {
            warn!(error = %e, "Failed to close statement");
        }
    }
}

/// Closes the cursor when dropped.
struct CursorScope<'s> {
    inner: Box<dyn Cursor + 's>,
}

impl<'s> CursorScope<'s> {
    fn new(inner: Box<dyn Cursor + 's>) -> Self {
        Self { inner }
    }
}

impl<'s> Deref for CursorScope<'s> {
    type Target = dyn Cursor + 's;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DerefMut for CursorScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.inner
    }
}

impl Drop for CursorScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.inner.close() {
            warn!(error = %e, "Failed to close cursor");
        }
    }
}
