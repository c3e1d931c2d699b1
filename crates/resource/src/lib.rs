//! # Encrypted database connections
//!
//! [`ConnectionFactory`] turns environment configuration into open SQL Server
//! connections with Always Encrypted support:
//!
//! 1. resolve the Azure AD client-secret credential,
//! 2. register the Azure Key Vault key-store provider (once per factory),
//! 3. read and parse `DB_CONNECTION_STRING`,
//! 4. open the connection through a [`Connector`].
//!
//! [`TdsConnector`] talks to real servers through `tiberius`. With the
//! `test-util` feature, [`testing::MockConnector`] stands in for it.
//!
//! ```rust,no_run
//! use azsecrets_resource::{Connection, ConnectionFactory, TdsConnector};
//! use futures::FutureExt;
//!
//! # async fn example() -> azsecrets_resource::Result<()> {
//! let factory = ConnectionFactory::new(TdsConnector::new());
//! let rows = factory
//!     .with_connection(|conn| async move { conn.query("SELECT 1", &[]).await }.boxed())
//!     .await?;
//! assert_eq!(rows.len(), 1);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

pub mod connection_string;
pub mod connector;
pub mod error;
pub mod factory;
pub mod tds;
pub mod value;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use connection_string::ConnectionString;
pub use connector::{Connection, Connector};
pub use error::{DriverError, Error, Result};
pub use factory::{ConnectionFactory, DB_CONNECTION_STRING};
pub use tds::{TdsConnection, TdsConnector};
pub use value::{Row, Value};
