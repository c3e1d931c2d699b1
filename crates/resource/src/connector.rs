//! Seam between the connection factory and the database driver

use async_trait::async_trait;
use azsecrets_keystore::ProviderRegistry;

use crate::connection_string::ConnectionString;
use crate::error::DriverError;
use crate::value::{Row, Value};

/// An open database connection.
///
/// Parameters bind positionally to `@P1`, `@P2`, ...
#[async_trait]
pub trait Connection: Send {
    /// Run a statement that returns no rows; yields the affected row count
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError>;

    /// Run a statement and collect the first result set
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;

    /// Close the connection
    async fn close(self) -> Result<(), DriverError>;
}

/// Opens connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connection type produced by this connector
    type Connection: Connection + 'static;

    /// Open a connection. Key-store providers for encrypted columns are
    /// looked up in `registry`.
    async fn open(
        &self,
        connection_string: &ConnectionString,
        registry: &ProviderRegistry,
    ) -> Result<Self::Connection, DriverError>;
}

/// Refuse an encryption-enabled connection when no provider can unwrap keys
pub(crate) fn require_key_store(
    connection_string: &ConnectionString,
    registry: &ProviderRegistry,
) -> Result<(), DriverError> {
    if connection_string.column_encryption_enabled() && !registry.is_registered() {
        return Err(DriverError::MissingKeyStoreProvider);
    }
    Ok(())
}
