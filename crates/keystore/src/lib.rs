//! Column-encryption key-store providers.
//!
//! A key-store provider unwraps the column encryption keys (CEKs) that protect
//! Always Encrypted columns, using a column master key held in an external key
//! store. The database driver looks providers up by name in a
//! [`ProviderRegistry`], which can be populated exactly once per process.
//!
//! [`AzureKeyVaultProvider`] keeps its master keys in Azure Key Vault or a
//! Managed HSM and authenticates with any [`TokenCredential`].
//!
//! [`TokenCredential`]: azsecrets_credential::TokenCredential
#![forbid(unsafe_code)]

mod azure;
mod envelope;
mod error;
mod provider;
mod registry;

pub use crate::azure::{AZURE_KEY_VAULT_PROVIDER_NAME, AzureKeyVaultProvider, KeyPath, TRUSTED_ENDPOINTS};
pub use crate::envelope::EncryptedColumnKey;
pub use crate::error::KeyStoreError;
pub use crate::provider::{ColumnEncryptionKeyStoreProvider, KeyEncryptionAlgorithm};
pub use crate::registry::{ProviderRegistry, global};
