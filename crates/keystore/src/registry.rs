//! Set-once registry of key-store providers, keyed by provider name.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::error::KeyStoreError;
use crate::provider::ColumnEncryptionKeyStoreProvider;

/// Prefix reserved for providers built into the database driver
const RESERVED_PREFIX: &str = "MSSQL_";

type Providers = HashMap<String, Arc<dyn ColumnEncryptionKeyStoreProvider>>;

/// Custom key-store providers the driver may use to unwrap column keys.
///
/// Populated at most once. Later attempts fail with
/// [`KeyStoreError::AlreadyRegistered`] and leave the first set untouched.
pub struct ProviderRegistry {
    providers: OnceLock<Providers>,
}

impl ProviderRegistry {
    /// An empty registry
    pub const fn new() -> Self {
        Self {
            providers: OnceLock::new(),
        }
    }

    /// Install `providers` as the registry's contents
    pub fn register(&self, providers: Providers) -> Result<(), KeyStoreError> {
        if self.register_if_absent(providers)? {
            Ok(())
        } else {
            Err(KeyStoreError::AlreadyRegistered)
        }
    }

    /// Install `providers` unless the registry is already populated.
    ///
    /// Returns `false` when an earlier registration won, in which case the
    /// registry keeps its contents. Invalid names are rejected either way.
    pub fn register_if_absent(&self, providers: Providers) -> Result<bool, KeyStoreError> {
        if providers.is_empty() {
            return Err(KeyStoreError::InvalidProviderName {
                name: String::new(),
                reason: "at least one provider is required",
            });
        }
        for name in providers.keys() {
            validate_name(name)?;
        }

        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();

        if self.providers.set(providers).is_err() {
            debug!(providers = ?names, "Key store providers already registered");
            return Ok(false);
        }

        info!(providers = ?names, "Registered column encryption key store providers");
        Ok(true)
    }

    /// Provider registered under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn ColumnEncryptionKeyStoreProvider>> {
        self.providers.get()?.get(name).cloned()
    }

    /// Whether providers have been registered
    pub fn is_registered(&self) -> bool {
        self.providers.get().is_some()
    }

    /// Registered provider names, sorted
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .get()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_names())
            .finish()
    }
}

fn validate_name(name: &str) -> Result<(), KeyStoreError> {
    if name.trim().is_empty() {
        return Err(KeyStoreError::InvalidProviderName {
            name: name.to_string(),
            reason: "must not be empty",
        });
    }
    let reserved = name
        .get(..RESERVED_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RESERVED_PREFIX));
    if reserved {
        return Err(KeyStoreError::InvalidProviderName {
            name: name.to_string(),
            reason: "the MSSQL_ prefix is reserved for built-in providers",
        });
    }
    Ok(())
}

static GLOBAL: ProviderRegistry = ProviderRegistry::new();

/// The process-wide registry
pub fn global() -> &'static ProviderRegistry {
    &GLOBAL
}
