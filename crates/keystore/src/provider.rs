use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::KeyStoreError;

/// Algorithm used to wrap a column encryption key with the master key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncryptionAlgorithm {
    /// RSA with OAEP padding (SHA-1 MGF), the only algorithm SQL Server emits
    RsaOaep,
}

impl KeyEncryptionAlgorithm {
    /// Name used in column master key metadata
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::RsaOaep => "RSA_OAEP",
        }
    }

    /// Name used by the Key Vault keys API
    pub fn key_vault_name(self) -> &'static str {
        match self {
            Self::RsaOaep => "RSA-OAEP",
        }
    }
}

impl FromStr for KeyEncryptionAlgorithm {
    type Err = KeyStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("RSA_OAEP") {
            Ok(Self::RsaOaep)
        } else {
            Err(KeyStoreError::UnsupportedAlgorithm(s.to_string()))
        }
    }
}

impl fmt::Display for KeyEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A key store that can wrap and unwrap column encryption keys
#[async_trait]
pub trait ColumnEncryptionKeyStoreProvider: Send + Sync {
    /// Unwrap an encrypted column encryption key using the master key at
    /// `master_key_path`
    async fn decrypt_column_encryption_key(
        &self,
        master_key_path: &str,
        algorithm: &str,
        encrypted_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError>;

    /// Wrap a plaintext column encryption key with the master key at
    /// `master_key_path`
    async fn encrypt_column_encryption_key(
        &self,
        master_key_path: &str,
        algorithm: &str,
        column_encryption_key: &[u8],
    ) -> Result<Vec<u8>, KeyStoreError>;
}
