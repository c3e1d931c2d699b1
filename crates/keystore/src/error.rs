use azsecrets_credential::CredentialError;
use thiserror::Error;

/// Key-store provider and registry errors
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// The registry has already been populated
    #[error("Key store providers cannot be registered more than once")]
    AlreadyRegistered,

    /// Empty or reserved provider name
    #[error("Invalid key store provider name '{name}': {reason}")]
    InvalidProviderName {
        /// Offending name
        name: String,
        /// Why it was refused
        reason: &'static str,
    },

    /// The column master key path is not a usable Key Vault key URL
    #[error("Invalid master key path '{path}': {reason}")]
    InvalidKeyPath {
        /// Offending path
        path: String,
        /// Why it was refused
        reason: String,
    },

    /// Only RSA_OAEP is supported for wrapping column encryption keys
    #[error("Unsupported key encryption algorithm '{0}', expected RSA_OAEP")]
    UnsupportedAlgorithm(String),

    /// The encrypted column encryption key is malformed
    #[error("Invalid encrypted column encryption key: {0}")]
    InvalidEncryptedKey(String),

    /// The envelope signature does not match the master key
    #[error("Signature of the encrypted column encryption key does not match master key '{path}'")]
    SignatureMismatch {
        /// Master key path the signature was checked against
        path: String,
    },

    /// Could not obtain a token for Key Vault
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Key Vault returned an error or could not be reached
    #[error("Key Vault {operation} failed: {reason}")]
    KeyVault {
        /// Key operation (wrapkey, unwrapkey, sign, verify)
        operation: &'static str,
        /// Status or transport error
        reason: String,
    },
}
