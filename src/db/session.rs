//! Caller-facing session API.
//!
//! A [`Session`] owns a [`TransactionRegistry`] and a [`QueryExecutor`]. Every
//! execution call takes a transaction identifier; an empty identifier targets the
//! default connection opened with [`Session::open`].
//!
//! Argument validation happens before the driver is touched. Driver failures
//! roll back and remove the targeted handle (see
//! [`TransactionRegistry::with_connection`]).

use crate::config::ConnectionSettings;
use crate::db::connection_string::ConnectionProperties;
use crate::db::driver::Driver;
use crate::db::executor::QueryExecutor;
use crate::db::sql::{bulk_insert, count_placeholders, procedure_call};
use crate::db::transaction_registry::TransactionRegistry;
use crate::error::{FbError, FbResult};
use crate::models::{ParamValue, ParameterList, ResultSet, TransactionInfo};

pub struct Session<D: Driver> {
    registry: TransactionRegistry<D>,
    executor: QueryExecutor,
}

impl<D: Driver> Session<D> {
    pub fn new(driver: D, settings: ConnectionSettings) -> Self {
        let executor = QueryExecutor::new(settings.query_timeout_duration());
        Self {
            registry: TransactionRegistry::new(driver, settings),
            executor,
        }
    }

    pub fn registry(&self) -> &TransactionRegistry<D> {
        &self.registry
    }

    pub fn default_id(&self) -> &str {
        self.registry.default_id()
    }

    // =========================================================================
    // Connection and transaction lifecycle
    // =========================================================================

    /// Open the default connection.
    pub fn open(
        &mut self,
        disable_auto_commit: bool,
        overrides: &ConnectionProperties,
    ) -> FbResult<()> {
        self.registry.open(disable_auto_commit, overrides)
    }

    /// Close the default connection.
    pub fn close(&mut self) -> FbResult<()> {
        let id = self.registry.default_id().to_string();
        self.registry.close(&id)
    }

    /// Close every connection and transaction.
    pub fn destroy(&mut self) -> FbResult<()> {
        self.registry.teardown()
    }

    pub fn begin_transaction(
        &mut self,
        transaction_id: &str,
        overwrite: bool,
        overrides: &ConnectionProperties,
    ) -> FbResult<()> {
        self.registry.begin(transaction_id, overwrite, overrides)
    }

    pub fn commit_transaction(&mut self, transaction_id: &str, keep_open: bool) -> FbResult<()> {
        self.registry.commit(transaction_id, keep_open)
    }

    pub fn rollback_transaction(&mut self, transaction_id: &str, keep_open: bool) -> FbResult<()> {
        self.registry.rollback(transaction_id, keep_open)
    }

    pub fn close_transaction(&mut self, transaction_id: &str) -> FbResult<()> {
        self.registry.close(transaction_id)
    }

    pub fn has_transactions_support(&mut self, transaction_id: &str) -> FbResult<bool> {
        self.registry.has_transactions_support(transaction_id)
    }

    pub fn list_transactions(&self) -> Vec<TransactionInfo> {
        self.registry.list_all()
    }

    // =========================================================================
    // Statement execution
    // =========================================================================

    /// Execute an update statement and return the affected row count.
    pub fn execute_query(&mut self, sql: &str, transaction_id: &str) -> FbResult<u64> {
        let id = self.registry.resolve(transaction_id)?;
        let sql = require_text(sql, "Invalid query")?;
        let executor = &self.executor;
        self.registry
            .with_connection(&id, |conn| Ok(executor.execute_update(conn, sql)?))
    }

    /// Execute a query and materialize its rows.
    pub fn execute_select_query(&mut self, sql: &str, transaction_id: &str) -> FbResult<ResultSet> {
        let id = self.registry.resolve(transaction_id)?;
        let sql = require_text(sql, "Invalid query")?;
        let executor = &self.executor;
        self.registry
            .with_connection(&id, |conn| Ok(executor.execute_select(conn, sql)?))
    }

    /// Execute a parameterized update and return the affected row count.
    ///
    /// The number of `?` placeholders must equal the parameter count.
    pub fn execute_prepared(
        &mut self,
        sql: &str,
        params: &ParameterList,
        transaction_id: &str,
    ) -> FbResult<u64> {
        let id = self.registry.resolve(transaction_id)?;
        let sql = require_text(sql, "Invalid query")?;
        ensure_placeholders(sql, params.len())?;
        let executor = &self.executor;
        self.registry
            .with_connection(&id, |conn| Ok(executor.execute_prepared(conn, sql, params)?))
    }

    /// Insert rows into `table` as one batch and return the successful row count.
    pub fn execute_bulk_insert(
        &mut self,
        table: &str,
        fields: &[String],
        rows: &[Vec<ParamValue>],
        transaction_id: &str,
    ) -> FbResult<u64> {
        let id = self.registry.resolve(transaction_id)?;
        let sql = bulk_insert(table, fields)?;
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != fields.len()) {
            return Err(FbError::invalid_argument(format!(
                "Invalid parameters: row {idx} has {} values, expected {}",
                row.len(),
                fields.len()
            )));
        }
        ensure_placeholders(&sql, fields.len())?;
        if rows.is_empty() {
            return Ok(0);
        }

        let executor = &self.executor;
        self.registry
            .with_connection(&id, |conn| Ok(executor.execute_batch(conn, &sql, rows)?))
    }

    /// Call a stored procedure that returns no result set.
    pub fn execute_procedure(
        &mut self,
        procedure: &str,
        params: &ParameterList,
        transaction_id: &str,
    ) -> FbResult<bool> {
        let id = self.registry.resolve(transaction_id)?;
        let call = procedure_call(procedure, params.len())?;
        ensure_placeholders(&call, params.len())?;
        let executor = &self.executor;
        self.registry
            .with_connection(&id, |conn| Ok(executor.execute_call(conn, &call, params)?))
    }

    /// Call a selectable stored procedure and materialize its rows.
    pub fn execute_selectable_procedure(
        &mut self,
        procedure: &str,
        params: &ParameterList,
        transaction_id: &str,
    ) -> FbResult<ResultSet> {
        let id = self.registry.resolve(transaction_id)?;
        let call = procedure_call(procedure, params.len())?;
        ensure_placeholders(&call, params.len())?;
        let executor = &self.executor;
        self.registry.with_connection(&id, |conn| {
            Ok(executor.execute_selectable_call(conn, &call, params)?)
        })
    }
}

fn require_text<'a>(text: &'a str, message: &str) -> FbResult<&'a str> {
    if text.trim().is_empty() {
        return Err(FbError::invalid_argument(message));
    }
    Ok(text)
}

fn ensure_placeholders(sql: &str, expected: usize) -> FbResult<()> {
    let found = count_placeholders(sql);
    if found != expected {
        return Err(FbError::invalid_argument(format!(
            "Invalid query parameters count: {found} placeholders, {expected} parameters"
        )));
    }
    Ok(())
}
