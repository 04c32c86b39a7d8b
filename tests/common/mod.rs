//! Scripted in-memory driver used by the integration tests.
//!
//! Every driver call is appended to a shared log as a short line such as
//! `c1 prepare Plain UPDATE T SET A = 1` or `c2 bind 1 binary_stream`, so tests
//! can assert on the exact path the session took.

#![allow(dead_code)]

use fbsql_session::ConnectionSettings;
use fbsql_session::db::{
    BatchOutcome, Binding, ColumnDescriptor, Connection, ConnectionProperties, Cursor, Driver,
    Statement, StatementKind,
};
use fbsql_session::error::{DriverError, DriverResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

pub const SYNTAX_ERROR_CODE: i32 = 335544569;

#[derive(Debug, Clone)]
pub enum MockCell {
    Null,
    Int(i64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct MockTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<MockCell>>,
}

impl MockTable {
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, ty)| ColumnDescriptor::new(*name, *ty))
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: Vec<MockCell>) -> Self {
        self.rows.push(cells);
        self
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub log: Vec<String>,
    pub results: HashMap<String, MockTable>,
    /// Statements whose SQL contains any of these fragments fail on execution
    pub failing_sql: Vec<String>,
    pub update_count: u64,
    pub batch_outcomes: Option<Vec<BatchOutcome>>,
    pub fail_connect: bool,
    pub fail_auto_commit: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    pub fail_close: bool,
    pub fail_statement_close: bool,
    pub supports_transactions: bool,
    pub connections: usize,
    pub last_url: Option<String>,
    pub last_properties: Option<ConnectionProperties>,
}

#[derive(Clone, Default)]
pub struct MockDriver {
    pub state: Rc<RefCell<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        {
            let mut state = driver.state.borrow_mut();
            state.update_count = 1;
            state.supports_transactions = true;
        }
        driver
    }

    pub fn with_result(self, sql: &str, table: MockTable) -> Self {
        self.state.borrow_mut().results.insert(sql.to_string(), table);
        self
    }

    pub fn fail_on(&self, fragment: &str) {
        self.state.borrow_mut().failing_sql.push(fragment.to_string());
    }

    pub fn set(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.state.borrow_mut());
    }

    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// Log lines containing `fragment`.
    pub fn entries(&self, fragment: &str) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|line| line.contains(fragment))
            .collect()
    }

    /// Position of the first log line containing `fragment`.
    pub fn position(&self, fragment: &str) -> Option<usize> {
        self.log().iter().position(|line| line.contains(fragment))
    }

    pub fn last_url(&self) -> Option<String> {
        self.state.borrow().last_url.clone()
    }

    pub fn last_properties(&self) -> Option<ConnectionProperties> {
        self.state.borrow().last_properties.clone()
    }
}

fn record(state: &Rc<RefCell<MockState>>, line: String) {
    state.borrow_mut().log.push(line);
}

fn driver_failure(message: String) -> DriverError {
    DriverError::new(SYNTAX_ERROR_CODE, Some("42000"), message)
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn connect(
        &self,
        url: &str,
        properties: &ConnectionProperties,
    ) -> DriverResult<MockConnection> {
        let id = {
            let mut state = self.state.borrow_mut();
            if state.fail_connect {
                return Err(DriverError::new(
                    335544721,
                    Some("08006"),
                    "Unable to complete network request",
                ));
            }
            state.connections += 1;
            state.last_url = Some(url.to_string());
            state.last_properties = Some(properties.clone());
            state.connections
        };
        record(&self.state, format!("connect c{id} {url}"));
        Ok(MockConnection {
            id,
            state: Rc::clone(&self.state),
            closed: false,
        })
    }
}

pub struct MockConnection {
    id: usize,
    state: Rc<RefCell<MockState>>,
    closed: bool,
}

impl Connection for MockConnection {
    fn set_auto_commit(&mut self, enabled: bool) -> DriverResult<()> {
        record(&self.state, format!("c{} auto_commit={enabled}", self.id));
        if self.state.borrow().fail_auto_commit {
            return Err(driver_failure("auto-commit not supported".to_string()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn prepare(&mut self, sql: &str, kind: StatementKind) -> DriverResult<Box<dyn Statement + '_>> {
        record(&self.state, format!("c{} prepare {kind:?} {sql}", self.id));
        Ok(Box::new(MockStatement {
            conn_id: self.id,
            sql: sql.to_string(),
            state: Rc::clone(&self.state),
            batched: 0,
        }))
    }

    fn commit(&mut self) -> DriverResult<()> {
        record(&self.state, format!("c{} commit", self.id));
        if self.state.borrow().fail_commit {
            return Err(DriverError::new(
                335544345,
                Some("40001"),
                "lock conflict on no wait transaction",
            ));
        }
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        record(&self.state, format!("c{} rollback", self.id));
        if self.state.borrow().fail_rollback {
            return Err(DriverError::new(335544328, Some("08003"), "rollback failed"));
        }
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        record(&self.state, format!("c{} close", self.id));
        self.closed = true;
        if self.state.borrow().fail_close {
            return Err(DriverError::new(
                335544726,
                Some("08006"),
                format!("Error closing c{}", self.id),
            ));
        }
        Ok(())
    }

    fn supports_transactions(&mut self) -> DriverResult<bool> {
        Ok(self.state.borrow().supports_transactions)
    }
}

pub struct MockStatement {
    conn_id: usize,
    sql: String,
    state: Rc<RefCell<MockState>>,
    batched: usize,
}

impl MockStatement {
    fn log(&self, action: &str) {
        record(&self.state, format!("c{} {action}", self.conn_id));
    }

    fn check_failure(&self) -> DriverResult<()> {
        let failing = self
            .state
            .borrow()
            .failing_sql
            .iter()
            .any(|f| self.sql.contains(f.as_str()));
        if failing {
            return Err(driver_failure(format!("Dynamic SQL Error: {}", self.sql)));
        }
        Ok(())
    }
}

impl Statement for MockStatement {
    fn set_query_timeout(&mut self, timeout: Duration) -> DriverResult<()> {
        self.log(&format!("timeout {}", timeout.as_secs()));
        Ok(())
    }

    fn bind(&mut self, index: usize, value: Binding<'_>) -> DriverResult<()> {
        self.log(&format!("bind {index} {}", value.kind()));
        Ok(())
    }

    fn mark_selectable(&mut self) -> DriverResult<()> {
        self.log("mark_selectable");
        Ok(())
    }

    fn execute(&mut self) -> DriverResult<bool> {
        self.check_failure()?;
        self.log("execute");
        Ok(false)
    }

    fn execute_update(&mut self) -> DriverResult<u64> {
        self.check_failure()?;
        self.log("execute_update");
        Ok(self.state.borrow().update_count)
    }

    fn execute_query(&mut self) -> DriverResult<Box<dyn Cursor + '_>> {
        self.check_failure()?;
        self.log("execute_query");
        let table = self
            .state
            .borrow()
            .results
            .get(&self.sql)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MockCursor {
            conn_id: self.conn_id,
            state: Rc::clone(&self.state),
            table,
            position: 0,
        }))
    }

    fn add_batch(&mut self) -> DriverResult<()> {
        self.batched += 1;
        self.log("add_batch");
        Ok(())
    }

    fn execute_batch(&mut self) -> DriverResult<Vec<BatchOutcome>> {
        self.check_failure()?;
        self.log("execute_batch");
        let scripted = self.state.borrow().batch_outcomes.clone();
        Ok(scripted.unwrap_or_else(|| vec![BatchOutcome::Count(1); self.batched]))
    }

    fn close(&mut self) -> DriverResult<()> {
        self.log("close statement");
        if self.state.borrow().fail_statement_close {
            return Err(driver_failure("statement close failed".to_string()));
        }
        Ok(())
    }
}

pub struct MockCursor {
    conn_id: usize,
    state: Rc<RefCell<MockState>>,
    table: MockTable,
    /// 1-based row position, 0 before the first advance
    position: usize,
}

impl MockCursor {
    fn cell(&self, index: usize) -> &MockCell {
        &self.table.rows[self.position - 1][index - 1]
    }
}

impl Cursor for MockCursor {
    fn columns(&self) -> DriverResult<Vec<ColumnDescriptor>> {
        Ok(self.table.columns.clone())
    }

    fn advance(&mut self) -> DriverResult<bool> {
        if self.position >= self.table.rows.len() {
            return Ok(false);
        }
        self.position += 1;
        Ok(true)
    }

    fn get_int(&mut self, index: usize) -> DriverResult<Option<i32>> {
        Ok(self.get_long(index)?.map(|v| v as i32))
    }

    fn get_long(&mut self, index: usize) -> DriverResult<Option<i64>> {
        Ok(match self.cell(index) {
            MockCell::Null => None,
            MockCell::Int(v) => Some(*v),
            MockCell::Double(v) => Some(*v as i64),
            MockCell::Text(s) => s.parse().ok(),
            MockCell::Blob(_) => None,
        })
    }

    fn get_double(&mut self, index: usize) -> DriverResult<Option<f64>> {
        Ok(match self.cell(index) {
            MockCell::Null => None,
            MockCell::Int(v) => Some(*v as f64),
            MockCell::Double(v) => Some(*v),
            MockCell::Text(s) => s.parse().ok(),
            MockCell::Blob(_) => None,
        })
    }

    fn get_string(&mut self, index: usize) -> DriverResult<Option<String>> {
        Ok(match self.cell(index) {
            MockCell::Null => None,
            MockCell::Int(v) => Some(v.to_string()),
            MockCell::Double(v) => Some(v.to_string()),
            MockCell::Text(s) => Some(s.clone()),
            MockCell::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        })
    }

    fn get_blob(&mut self, index: usize) -> DriverResult<Option<Vec<u8>>> {
        Ok(match self.cell(index) {
            MockCell::Null => None,
            MockCell::Blob(b) => Some(b.clone()),
            MockCell::Text(s) => Some(s.as_bytes().to_vec()),
            MockCell::Int(_) | MockCell::Double(_) => None,
        })
    }

    fn close(&mut self) -> DriverResult<()> {
        record(&self.state, format!("c{} close cursor", self.conn_id));
        Ok(())
    }
}

/// Settings pointing at the test database.
pub fn settings() -> ConnectionSettings {
    ConnectionSettings {
        host: "db1".to_string(),
        port: 3050,
        database: "/data/mydb.fdb".to_string(),
        ..ConnectionSettings::default()
    }
}

pub fn no_overrides() -> ConnectionProperties {
    ConnectionProperties::new()
}
