//! Error types for connection acquisition and statement execution
use azsecrets_credential::ConfigError;
use azsecrets_keystore::KeyStoreError;
use thiserror::Error;

/// Result type for connection factory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure talking to the database
#[derive(Error, Debug)]
pub enum DriverError {
    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TDS login, protocol or server-side statement error
    #[error("TDS error: {0}")]
    Protocol(#[from] tiberius::error::Error),

    /// Refused by a connector or connection that is not backed by a server
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Column encryption was requested but the provider registry is empty
    #[error("Column encryption is enabled but no key store provider is registered")]
    MissingKeyStoreProvider,

    /// A result cell is absent or has an unexpected type
    #[error("Column '{column}': {reason}")]
    Column {
        /// Column name
        column: String,
        /// What was wrong with it
        reason: String,
    },
}

impl DriverError {
    pub(crate) fn column(column: &str, reason: impl Into<String>) -> Self {
        Self::Column {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error returned by [`ConnectionFactory`](crate::ConnectionFactory)
#[derive(Error, Debug)]
pub enum Error {
    /// Identity or connection string configuration is missing or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Key-store provider registration failed
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    /// Opening the connection or running a statement failed
    #[error("database driver error")]
    Connection(#[from] DriverError),
}
