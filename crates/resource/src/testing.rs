//! In-memory connector for exercising code that opens connections

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use azsecrets_keystore::ProviderRegistry;
use parking_lot::Mutex;

use crate::connection_string::ConnectionString;
use crate::connector::{Connection, Connector, require_key_store};
use crate::error::DriverError;
use crate::value::{Row, Value};

/// What a mocked statement produces
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// Rows affected by a non-query
    Affected(u64),
    /// A result set
    Rows(Vec<Row>),
}

/// Decides the outcome of each statement run on a [`MockConnection`]
pub type StatementHandler =
    Arc<dyn Fn(&str, &[Value]) -> Result<StatementResult, DriverError> + Send + Sync>;

/// A statement as it reached the connection
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// SQL text
    pub sql: String,
    /// Bound parameters
    pub params: Vec<Value>,
}

struct MockState {
    opens: AtomicU32,
    closes: AtomicU32,
    fail_open: AtomicBool,
    handler: Mutex<StatementHandler>,
    statements: Mutex<Vec<ExecutedStatement>>,
    connection_strings: Mutex<Vec<String>>,
}

/// Connector that records what it is asked to do.
///
/// Clones share state, so a test can keep one handle and give another to
/// the code under test.
#[derive(Clone)]
pub struct MockConnector {
    state: Arc<MockState>,
}

impl MockConnector {
    /// Connector whose statements all succeed, affecting no rows
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                opens: AtomicU32::new(0),
                closes: AtomicU32::new(0),
                fail_open: AtomicBool::new(false),
                handler: Mutex::new(Arc::new(|_: &str, _: &[Value]| {
                    Ok(StatementResult::Affected(0))
                })),
                statements: Mutex::new(Vec::new()),
                connection_strings: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Route statements through `handler`
    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<StatementResult, DriverError> + Send + Sync + 'static,
    {
        *self.state.handler.lock() = Arc::new(handler);
        self
    }

    /// Make subsequent `open` calls fail
    pub fn fail_open(&self, fail: bool) {
        self.state.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Connections opened so far
    pub fn open_count(&self) -> u32 {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Connections closed so far
    pub fn close_count(&self) -> u32 {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Every statement run, in order
    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.state.statements.lock().clone()
    }

    /// Driver strings passed to `open`, in order
    pub fn connection_strings(&self) -> Vec<String> {
        self.state.connection_strings.lock().clone()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnector")
            .field("opens", &self.open_count())
            .field("closes", &self.close_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn open(
        &self,
        connection_string: &ConnectionString,
        registry: &ProviderRegistry,
    ) -> Result<MockConnection, DriverError> {
        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(DriverError::Rejected("mock connector refused to open".into()));
        }
        require_key_store(connection_string, registry)?;

        self.state
            .connection_strings
            .lock()
            .push(connection_string.to_driver_string());
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }
}

/// Connection handed out by [`MockConnector`]
pub struct MockConnection {
    state: Arc<MockState>,
}

impl MockConnection {
    fn run(&self, sql: &str, params: &[Value]) -> Result<StatementResult, DriverError> {
        self.state.statements.lock().push(ExecutedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        let handler = Arc::clone(&self.state.handler.lock());
        handler(sql, params)
    }
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        Ok(match self.run(sql, params)? {
            StatementResult::Affected(n) => n,
            StatementResult::Rows(rows) => rows.len() as u64,
        })
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        Ok(match self.run(sql, params)? {
            StatementResult::Rows(rows) => rows,
            StatementResult::Affected(_) => Vec::new(),
        })
    }

    async fn close(self) -> Result<(), DriverError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
