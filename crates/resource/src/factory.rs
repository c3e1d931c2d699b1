//! Connection factory: credential, one-time provider registration, open

use std::collections::HashMap;
use std::sync::Arc;

use azsecrets_credential::{ClientSecretCredential, ConfigError, EnvSource, ProcessEnv};
use azsecrets_keystore::{
    AZURE_KEY_VAULT_PROVIDER_NAME, AzureKeyVaultProvider, ColumnEncryptionKeyStoreProvider,
    KeyStoreError, ProviderRegistry,
};
use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::connection_string::ConnectionString;
use crate::connector::{Connection, Connector};
use crate::error::{DriverError, Result};

/// Environment variable holding the ADO.NET connection string
pub const DB_CONNECTION_STRING: &str = "DB_CONNECTION_STRING";

/// Opens connections with the Azure Key Vault key-store provider in place.
///
/// Every call resolves the identity credential from the environment. The
/// first call also registers an [`AzureKeyVaultProvider`] built from that
/// credential unless the registry already holds providers. Any later call,
/// from this factory or another one sharing the registry, skips registration.
pub struct ConnectionFactory<C, E = ProcessEnv> {
    connector: C,
    env: E,
    registry: &'static ProviderRegistry,
    registered: OnceCell<()>,
}

impl<C: Connector> ConnectionFactory<C, ProcessEnv> {
    /// Factory reading the process environment and using the global registry
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            env: ProcessEnv,
            registry: azsecrets_keystore::global(),
            registered: OnceCell::new(),
        }
    }
}

impl<C, E> ConnectionFactory<C, E>
where
    C: Connector,
    E: EnvSource + Send + Sync,
{
    /// Read configuration from `env` instead
    pub fn with_env<E2: EnvSource + Send + Sync>(self, env: E2) -> ConnectionFactory<C, E2> {
        ConnectionFactory {
            connector: self.connector,
            env,
            registry: self.registry,
            registered: self.registered,
        }
    }

    /// Register providers into `registry` instead of the global one
    pub fn with_registry(mut self, registry: &'static ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registry providers are registered into
    pub fn registry(&self) -> &'static ProviderRegistry {
        self.registry
    }

    /// Whether this factory has seen the provider registration through
    pub fn is_registered(&self) -> bool {
        self.registered.initialized()
    }

    /// Open a connection, registering the key-store provider first if needed.
    ///
    /// Fails with a configuration error, without touching the network, when
    /// the identity variables or the connection string are missing.
    #[instrument(skip(self))]
    pub async fn get_connection(&self) -> Result<C::Connection> {
        let credential = azsecrets_credential::resolve_credential(&self.env)?;
        self.ensure_registered(credential).await?;

        let connection_string = self.connection_string()?;
        let connection = self
            .connector
            .open(&connection_string, self.registry)
            .await?;

        info!(
            server = connection_string.server().unwrap_or("<unset>"),
            database = connection_string.database().unwrap_or("<default>"),
            column_encryption = connection_string.column_encryption_enabled(),
            "Opened database connection"
        );
        Ok(connection)
    }

    /// Run `f` on a fresh connection and close it afterwards, whether `f`
    /// succeeded or not.
    ///
    /// A close failure is reported only when `f` itself succeeded.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, std::result::Result<T, DriverError>>,
    {
        let mut connection = self.get_connection().await?;
        let outcome = f(&mut connection).await;
        let closed = connection.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Closing connection after a failed statement also failed");
                }
                Err(err.into())
            }
        }
    }

    async fn ensure_registered(
        &self,
        credential: ClientSecretCredential,
    ) -> std::result::Result<(), KeyStoreError> {
        if self.registered.initialized() {
            debug!("Key store provider already registered");
            return Ok(());
        }

        self.registered
            .get_or_try_init(|| async move {
                // another factory on the same registry may have got there first
                if self.registry.is_registered() {
                    debug!("Key store provider registered by another factory");
                    return Ok(());
                }
                let provider = AzureKeyVaultProvider::new(Arc::new(credential));
                let mut providers: HashMap<String, Arc<dyn ColumnEncryptionKeyStoreProvider>> =
                    HashMap::new();
                providers.insert(AZURE_KEY_VAULT_PROVIDER_NAME.to_string(), Arc::new(provider));
                self.registry.register_if_absent(providers).map(|_| ())
            })
            .await?;
        Ok(())
    }

    fn connection_string(&self) -> std::result::Result<ConnectionString, ConfigError> {
        let raw = self
            .env
            .non_empty(DB_CONNECTION_STRING)
            .ok_or(ConfigError::MissingConnectionString {
                variable: DB_CONNECTION_STRING,
            })?;
        ConnectionString::parse(&raw)
    }
}

impl<C, E> std::fmt::Debug for ConnectionFactory<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("registry", self.registry)
            .field("registered", &self.registered.initialized())
            .finish_non_exhaustive()
    }
}
