//! Transaction registry for named driver connections.
//!
//! Each identifier maps to one live connection with its own commit/rollback
//! lifecycle. A reserved default identifier, generated once per registry, backs
//! the implicit single-connection mode used when callers pass an empty id.
//!
//! The registry is single-owner: every mutating call takes `&mut self`.

use crate::config::ConnectionSettings;
use crate::db::connection_string::{
    ConnectionProperties, build_connection_string, driver_properties, effective_properties,
};
use crate::db::driver::{Connection, Driver};
use crate::error::{DriverError, FbError, FbResult};
use crate::models::TransactionInfo;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

struct TransactionHandle<C> {
    /// `None` once the connection has been handed back to the driver
    connection: Option<C>,
    auto_commit: bool,
    created_at: Instant,
}

impl<C: Connection> TransactionHandle<C> {
    /// Close the underlying connection if it is still open.
    fn close(&mut self) -> Option<DriverError> {
        let mut conn = self.connection.take()?;
        if conn.is_closed() {
            return None;
        }
        conn.close().err()
    }
}

pub struct TransactionRegistry<D: Driver> {
    driver: D,
    settings: ConnectionSettings,
    default_id: String,
    handles: HashMap<String, TransactionHandle<D::Connection>>,
    /// System start time for converting Instant to DateTime
    system_start_instant: Instant,
    system_start_datetime: DateTime<Utc>,
}

impl<D: Driver> TransactionRegistry<D> {
    /// Create a new transaction registry.
    pub fn new(driver: D, settings: ConnectionSettings) -> Self {
        Self {
            driver,
            settings,
            default_id: generate_default_id(),
            handles: HashMap::new(),
            system_start_instant: Instant::now(),
            system_start_datetime: Utc::now(),
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// The reserved identifier used when callers pass an empty id.
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Open the default connection.
    pub fn open(
        &mut self,
        disable_auto_commit: bool,
        overrides: &ConnectionProperties,
    ) -> FbResult<()> {
        if self.handles.contains_key(&self.default_id) {
            return Err(FbError::already_open(self.default_id.clone()));
        }

        let conn = self.connect(disable_auto_commit, overrides)?;
        let id = self.default_id.clone();
        self.insert(id.clone(), conn, !disable_auto_commit);

        info!(
            transaction_id = %id,
            auto_commit = !disable_auto_commit,
            "Default connection opened"
        );
        Ok(())
    }

    /// Begin a named transaction on a fresh connection with auto-commit disabled.
    ///
    /// With `overwrite`, a live handle under the same id is closed and replaced.
    pub fn begin(
        &mut self,
        transaction_id: &str,
        overwrite: bool,
        overrides: &ConnectionProperties,
    ) -> FbResult<()> {
        let id = transaction_id.trim();
        if id.is_empty() {
            return Err(FbError::InvalidIdentifier);
        }
        if self.handles.contains_key(id) && !overwrite {
            return Err(FbError::already_started(id));
        }

        if let Some(mut prior) = self.handles.remove(id) {
            if let Some(e) = prior.close() {
                warn!(transaction_id = %id, error = %e, "Failed to close replaced transaction");
            }
            debug!(transaction_id = %id, "Replaced existing transaction");
        }

        let conn = self.connect(true, overrides)?;
        self.insert(id.to_string(), conn, false);

        info!(transaction_id = %id, "Transaction started");
        Ok(())
    }

    /// Commit a transaction. Unless `keep_open`, the handle is closed and
    /// removed whether or not the commit succeeded.
    pub fn commit(&mut self, transaction_id: &str, keep_open: bool) -> FbResult<()> {
        self.finish(transaction_id, keep_open, true)
    }

    /// Roll back a transaction. Unless `keep_open`, the handle is closed and
    /// removed whether or not the rollback succeeded.
    pub fn rollback(&mut self, transaction_id: &str, keep_open: bool) -> FbResult<()> {
        self.finish(transaction_id, keep_open, false)
    }

    fn finish(&mut self, transaction_id: &str, keep_open: bool, commit: bool) -> FbResult<()> {
        let (id, conn) = self.live_connection(transaction_id)?;
        let result = (if commit { conn.commit() } else { conn.rollback() }).map_err(FbError::from);
        let action = if commit { "committed" } else { "rolled back" };

        match &result {
            Ok(()) => info!(transaction_id = %id, keep_open, "Transaction {action}"),
            Err(e) => warn!(transaction_id = %id, error = %e, "Transaction could not be {action}"),
        }

        if keep_open {
            return result;
        }

        let close_error = self.remove(&id);
        match result {
            Ok(()) => close_error.map_or(Ok(()), |e| Err(e.into())),
            Err(e) => Err(e.with_secondary(close_error)),
        }
    }

    /// Close and remove a handle. Closing an unknown id is a no-op.
    pub fn close(&mut self, transaction_id: &str) -> FbResult<()> {
        let id = transaction_id.trim();
        if id.is_empty() {
            return Err(FbError::InvalidIdentifier);
        }
        if !self.handles.contains_key(id) {
            debug!(transaction_id = %id, "Close requested for inactive transaction");
            return Ok(());
        }

        let id = id.to_string();
        match self.remove(&id) {
            Some(e) => Err(e.into()),
            None => {
                info!(transaction_id = %id, "Transaction closed");
                Ok(())
            }
        }
    }

    /// Map an identifier to a live handle key. Empty maps to the default id.
    pub fn resolve(&self, transaction_id: &str) -> FbResult<String> {
        let id = match transaction_id.trim() {
            "" => self.default_id.as_str(),
            id => id,
        };
        if self.handles.contains_key(id) {
            Ok(id.to_string())
        } else {
            Err(FbError::inactive(id))
        }
    }

    /// Run an operation on a live connection.
    ///
    /// A driver failure rolls back the transaction and removes the handle before
    /// the error is returned; cleanup failures are attached as secondary errors.
    pub fn with_connection<T>(
        &mut self,
        transaction_id: &str,
        op: impl FnOnce(&mut D::Connection) -> FbResult<T>,
    ) -> FbResult<T> {
        let (id, conn) = self.live_connection(transaction_id)?;
        match op(conn) {
            Err(err) if err.is_driver() => {
                warn!(transaction_id = %id, error = %err, "Rolling back after failed statement");
                let cleanup = self.abort(&id);
                if let Some(e) = &cleanup {
                    warn!(transaction_id = %id, error = %e, "Cleanup after failure also failed");
                }
                Err(err.with_secondary(cleanup))
            }
            other => other,
        }
    }

    /// Whether the connection behind `transaction_id` supports transactions.
    pub fn has_transactions_support(&mut self, transaction_id: &str) -> FbResult<bool> {
        let (_, conn) = self.live_connection(transaction_id)?;
        conn.supports_transactions().map_err(FbError::from)
    }

    /// Close every handle, continuing past failures, then clear the registry.
    ///
    /// Failures are reported together as one aggregate driver error.
    pub fn teardown(&mut self) -> FbResult<()> {
        let total = self.handles.len();
        let failures: Vec<DriverError> = self
            .handles
            .drain()
            .filter_map(|(id, mut handle)| {
                let failure = handle.close();
                if let Some(e) = &failure {
                    warn!(transaction_id = %id, error = %e, "Failed to close during teardown");
                }
                failure
            })
            .collect();

        info!(handles = total, failed = failures.len(), "Registry torn down");
        FbError::aggregate(failures).map_or(Ok(()), Err)
    }

    /// List all live handles with their metadata.
    pub fn list_all(&self) -> Vec<TransactionInfo> {
        self.handles
            .iter()
            .map(|(id, handle)| {
                // Convert Instant to DateTime by calculating offset from system start
                let offset_from_start = handle.created_at.duration_since(self.system_start_instant);
                TransactionInfo {
                    transaction_id: id.clone(),
                    is_default: *id == self.default_id,
                    auto_commit: handle.auto_commit,
                    started_at: self.system_start_datetime + offset_from_start,
                    duration_secs: handle.created_at.elapsed().as_secs(),
                }
            })
            .collect()
    }

    /// Get the number of live handles.
    pub fn count(&self) -> usize {
        self.handles.len()
    }

    pub fn is_active(&self, transaction_id: &str) -> bool {
        self.resolve(transaction_id).is_ok()
    }

    fn live_connection(&mut self, transaction_id: &str) -> FbResult<(String, &mut D::Connection)> {
        let id = self.resolve(transaction_id)?;
        let conn = self
            .handles
            .get_mut(&id)
            .and_then(|h| h.connection.as_mut())
            .filter(|c| !c.is_closed())
            .ok_or_else(|| FbError::inactive(id.as_str()))?;
        Ok((id, conn))
    }

    fn connect(
        &self,
        disable_auto_commit: bool,
        overrides: &ConnectionProperties,
    ) -> FbResult<D::Connection> {
        let options = effective_properties(&self.settings, overrides);
        let url = build_connection_string(&self.settings, &options);
        let properties = driver_properties(&self.settings, &options);

        debug!(url = %url, "Connecting");
        let mut conn = self.driver.connect(&url, &properties)?;

        if disable_auto_commit {
            if let Err(e) = conn.set_auto_commit(false) {
                if let Err(close_err) = conn.close() {
                    debug!(error = %close_err, "Failed to close connection after setup error");
                }
                return Err(e.into());
            }
        }
        Ok(conn)
    }

    fn insert(&mut self, id: String, conn: D::Connection, auto_commit: bool) {
        self.handles.insert(
            id,
            TransactionHandle {
                connection: Some(conn),
                auto_commit,
                created_at: Instant::now(),
            },
        );
    }

    /// Remove and close a handle, returning any close failure.
    fn remove(&mut self, id: &str) -> Option<DriverError> {
        self.handles.remove(id)?.close()
    }

    /// Roll back (when auto-commit is off), close and remove a handle.
    fn abort(&mut self, id: &str) -> Option<DriverError> {
        let mut handle = self.handles.remove(id)?;
        let rollback_error = match handle.connection.as_mut() {
            Some(conn) if !handle.auto_commit && !conn.is_closed() => conn.rollback().err(),
            _ => None,
        };
        let close_error = handle.close();

        match (rollback_error, close_error) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        }
    }
}

impl<D: Driver> Drop for TransactionRegistry<D> {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        if let Err(e) = self.teardown() {
            warn!(error = %e, "Teardown on drop failed");
        }
    }
}

/// Generate the reserved default identifier.
fn generate_default_id() -> String {
    format!("default_{}", uuid::Uuid::new_v4().simple())
}
