//! Azure Key Vault key-store provider
//!
//! Column master keys live in Azure Key Vault (or a Managed HSM) and are
//! addressed by their key identifier URL, e.g.
//! `https://myvault.vault.azure.net/keys/CMK/4c05f1a41b12488f9cba2ea964b6a700`.
//! Wrapping, unwrapping, signing and signature checks all happen inside the
//! vault; the private key never leaves it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use azsecrets_credential::TokenCredential;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;
use zeroize::Zeroizing;

use crate::envelope::{EncryptedColumnKey, digest, unsigned_envelope};
use crate::error::KeyStoreError;
use crate::provider::{ColumnEncryptionKeyStoreProvider, KeyEncryptionAlgorithm};

/// Name the driver looks this provider up by
pub const AZURE_KEY_VAULT_PROVIDER_NAME: &str = "AZURE_KEY_VAULT";

/// Host suffixes accepted for master key paths
pub const TRUSTED_ENDPOINTS: &[&str] = &[
    "vault.azure.net",
    "vault.azure.cn",
    "vault.usgovcloudapi.net",
    "vault.microsoftazure.de",
    "managedhsm.azure.net",
    "managedhsm.azure.cn",
    "managedhsm.usgovcloudapi.net",
    "managedhsm.microsoftazure.de",
];

const API_VERSION: &str = "7.4";
const SIGNATURE_ALGORITHM: &str = "RS256";

/// A validated Key Vault key identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    key_url: Url,
    endpoint: String,
}

impl KeyPath {
    /// URL of a key operation, e.g. `.../keys/CMK/abc/unwrapkey?api-version=7.4`
    fn operation_url(&self, operation: &str) -> Result<Url, KeyStoreError> {
        let mut url = self.key_url.clone();
        url.path_segments_mut()
            .map_err(|()| KeyStoreError::InvalidKeyPath {
                path: self.key_url.to_string(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .push(operation);
        url.query_pairs_mut().clear().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    /// Token scope for the vault family this key belongs to
    pub fn scope(&self) -> String {
        format!("https://{}/.default", self.endpoint)
    }

    /// Key identifier as given
    pub fn as_str(&self) -> &str {
        self.key_url.as_str()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_url.as_str())
    }
}

/// Key-store provider backed by Azure Key Vault
pub struct AzureKeyVaultProvider {
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
    trusted_endpoints: Vec<String>,
    allow_http: bool,
}

#[derive(Serialize)]
struct KeyOperationRequest<'a> {
    alg: &'a str,
    value: String,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    alg: &'a str,
    digest: String,
    value: String,
}

#[derive(Deserialize)]
struct KeyOperationResult {
    value: String,
}

#[derive(Deserialize)]
struct VerifyResult {
    value: bool,
}

impl AzureKeyVaultProvider {
    /// Provider that authenticates to Key Vault with `credential`
    pub fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            credential,
            http: reqwest::Client::new(),
            trusted_endpoints: TRUSTED_ENDPOINTS.iter().map(|e| (*e).to_string()).collect(),
            allow_http: false,
        }
    }

    /// Replace the accepted host suffixes (private clouds, emulators)
    pub fn with_trusted_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Accept `http://` key paths. Only for local Key Vault emulators.
    pub fn allow_plain_http(mut self) -> Self {
        self.allow_http = true;
        self
    }

    /// Share an existing HTTP client
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Check that `master_key_path` is a key URL on a trusted vault host
    pub fn validate_key_path(&self, master_key_path: &str) -> Result<KeyPath, KeyStoreError> {
        let invalid = |reason: &str| KeyStoreError::InvalidKeyPath {
            path: master_key_path.to_string(),
            reason: reason.to_string(),
        };

        if master_key_path.trim().is_empty() {
            return Err(invalid("must not be empty"));
        }

        let url = Url::parse(master_key_path).map_err(|e| invalid(&e.to_string()))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            _ => return Err(invalid("must use https")),
        }

        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host"))?
            .to_ascii_lowercase();
        let endpoint = self
            .trusted_endpoints
            .iter()
            .find(|ep| {
                let ep = ep.to_ascii_lowercase();
                host == ep || host.ends_with(&format!(".{ep}"))
            })
            .ok_or_else(|| invalid("host is not a trusted Key Vault endpoint"))?
            .clone();

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let well_formed = matches!(segments.as_slice(), ["keys", _] | ["keys", _, _]);
        if !well_formed {
            return Err(invalid("expected /keys/<name>[/<version>]"));
        }

        Ok(KeyPath {
            key_url: url,
            endpoint,
        })
    }

    async fn key_operation<B: Serialize + Sync>(
        &self,
        key_path: &KeyPath,
        operation: &'static str,
        body: &B,
    ) -> Result<reqwest::Response, KeyStoreError> {
        let url = key_path.operation_url(operation)?;
        let scope = key_path.scope();
        let token = self.credential.get_token(&[scope.as_str()]).await?;

        debug!(key = %key_path, operation, "Calling Key Vault");

        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .json(body)
            .send()
            .await
            .map_err(|e| KeyStoreError::KeyVault {
                operation,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(key = %key_path, operation, status = %status, "Key Vault rejected request");
            return Err(KeyStoreError::KeyVault {
                operation,
                reason: format!("HTTP {status}"),
            });
        }
        Ok(response)
    }

    async fn bytes_operation(
        &self,
        key_path: &KeyPath,
        operation: &'static str,
        alg: &str,
        value: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
        let body = KeyOperationRequest {
            alg,
            value: B64URL.encode(value),
        };
        let result: KeyOperationResult = self
            .key_operation(key_path, operation, &body)
            .await?
            .json()
            .await
            .map_err(|e| KeyStoreError::KeyVault {
                operation,
                reason: format!("unreadable response: {e}"),
            })?;
        B64URL
            .decode(result.value.as_bytes())
            .map(Zeroizing::new)
            .map_err(|e| KeyStoreError::KeyVault {
                operation,
                reason: format!("response value is not base64url: {e}"),
            })
    }

    async fn verify(
        &self,
        key_path: &KeyPath,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyStoreError> {
        let body = VerifyRequest {
            alg: SIGNATURE_ALGORITHM,
            digest: B64URL.encode(digest),
            value: B64URL.encode(signature),
        };
        let result: VerifyResult = self
            .key_operation(key_path, "verify", &body)
            .await?
            .json()
            .await
            .map_err(|e| KeyStoreError::KeyVault {
                operation: "verify",
                reason: format!("unreadable response: {e}"),
            })?;
        Ok(result.value)
    }
}

#[async_trait]
impl ColumnEncryptionKeyStoreProvider for AzureKeyVaultProvider {
    #[tracing::instrument(skip(self, encrypted_key), fields(provider = AZURE_KEY_VAULT_PROVIDER_NAME))]
    async fn decrypt_column_encryption_key(
        &self,
        master_key_path: &str,
        algorithm: &str,
        encrypted_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
        let key_path = self.validate_key_path(master_key_path)?;
        let algorithm: KeyEncryptionAlgorithm = algorithm.parse()?;
        let envelope = EncryptedColumnKey::parse(encrypted_key)?;

        let digest = envelope.signed_digest();
        if !self.verify(&key_path, &digest, envelope.signature()).await? {
            return Err(KeyStoreError::SignatureMismatch {
                path: master_key_path.to_string(),
            });
        }

        self.bytes_operation(
            &key_path,
            "unwrapkey",
            algorithm.key_vault_name(),
            envelope.ciphertext(),
        )
        .await
    }

    #[tracing::instrument(skip(self, column_encryption_key), fields(provider = AZURE_KEY_VAULT_PROVIDER_NAME))]
    async fn encrypt_column_encryption_key(
        &self,
        master_key_path: &str,
        algorithm: &str,
        column_encryption_key: &[u8],
    ) -> Result<Vec<u8>, KeyStoreError> {
        let key_path = self.validate_key_path(master_key_path)?;
        let algorithm: KeyEncryptionAlgorithm = algorithm.parse()?;
        if column_encryption_key.is_empty() {
            return Err(KeyStoreError::InvalidEncryptedKey(
                "column encryption key must not be empty".to_string(),
            ));
        }

        let ciphertext = self
            .bytes_operation(
                &key_path,
                "wrapkey",
                algorithm.key_vault_name(),
                column_encryption_key,
            )
            .await?;

        let mut envelope = unsigned_envelope(master_key_path, &ciphertext)?;
        let signed_digest = digest(&envelope);
        let signature = self
            .bytes_operation(&key_path, "sign", SIGNATURE_ALGORITHM, &signed_digest)
            .await?;
        envelope.extend_from_slice(&signature);
        Ok(envelope)
    }
}

impl fmt::Debug for AzureKeyVaultProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureKeyVaultProvider")
            .field("trusted_endpoints", &self.trusted_endpoints)
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azsecrets_credential::testing::StaticTokenCredential;

    fn provider() -> AzureKeyVaultProvider {
        AzureKeyVaultProvider::new(Arc::new(StaticTokenCredential::new("t")))
    }

    #[test]
    fn test_accepts_versioned_and_unversioned_keys() {
        let p = provider();
        assert!(p
            .validate_key_path("https://myvault.vault.azure.net/keys/CMK/4c05f1a4")
            .is_ok());
        assert!(p.validate_key_path("https://myvault.vault.azure.net/keys/CMK").is_ok());
        assert!(p
            .validate_key_path("https://hsm1.managedhsm.azure.net/keys/CMK/")
            .is_ok());
    }

    #[test]
    fn test_rejects_untrusted_hosts() {
        let err = provider()
            .validate_key_path("https://myvault.evil.example/keys/CMK")
            .unwrap_err();
        assert!(err.to_string().contains("trusted"));

        // suffix match must be on a label boundary
        assert!(provider()
            .validate_key_path("https://notvault.azure.net/keys/CMK")
            .is_err());
    }

    #[test]
    fn test_rejects_plain_http_and_non_key_paths() {
        let p = provider();
        assert!(p.validate_key_path("http://myvault.vault.azure.net/keys/CMK").is_err());
        assert!(p.validate_key_path("https://myvault.vault.azure.net/secrets/CMK").is_err());
        assert!(p.validate_key_path("").is_err());
    }

    #[test]
    fn test_operation_url_and_scope() {
        let key = provider()
            .validate_key_path("https://myvault.vault.azure.net/keys/CMK/abc")
            .unwrap();
        assert_eq!(
            key.operation_url("unwrapkey").unwrap().as_str(),
            "https://myvault.vault.azure.net/keys/CMK/abc/unwrapkey?api-version=7.4"
        );
        assert_eq!(key.scope(), "https://vault.azure.net/.default");
    }

    #[test]
    fn test_operation_url_with_trailing_slash() {
        let key = provider()
            .validate_key_path("https://myvault.vault.azure.net/keys/CMK/")
            .unwrap();
        assert_eq!(
            key.operation_url("sign").unwrap().as_str(),
            "https://myvault.vault.azure.net/keys/CMK/sign?api-version=7.4"
        );
    }

    #[test]
    fn test_custom_endpoints_and_http() {
        let p = provider()
            .with_trusted_endpoints(["127.0.0.1"])
            .allow_plain_http();
        assert!(p.validate_key_path("http://127.0.0.1:8443/keys/CMK/1").is_ok());
    }
}
