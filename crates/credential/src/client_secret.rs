//! OAuth2 client-credentials grant against Azure AD

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::core::{AccessToken, ConfigError, CredentialError, SecureString};

/// Public-cloud Azure AD authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";

/// Maximum length for error response body to log (prevents log flooding)
const MAX_ERROR_BODY_LOG_LENGTH: usize = 500;

/// Source of bearer tokens for a set of scopes
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquire a token valid for `scopes`
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError>;
}

/// Tenant id, client id and client secret of an Azure AD app registration
#[derive(Clone)]
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: SecureString,
    authority_host: Url,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
}

impl ClientSecretCredential {
    /// Build a credential against the public-cloud authority.
    ///
    /// The tenant id may only contain ASCII alphanumerics, `-` and `.`, since
    /// it becomes a path segment of the token endpoint.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecureString,
    ) -> Result<Self, ConfigError> {
        let tenant_id = tenant_id.into();
        validate_tenant_id(&tenant_id)?;

        let authority_host = Url::parse(DEFAULT_AUTHORITY_HOST)
            .map_err(|e| ConfigError::invalid("authority_host", e.to_string()))?;

        Ok(Self {
            tenant_id,
            client_id: client_id.into(),
            client_secret,
            authority_host,
            http: reqwest::Client::new(),
        })
    }

    /// Use a different authority (sovereign clouds, test servers)
    pub fn with_authority_host(mut self, authority_host: &str) -> Result<Self, ConfigError> {
        let mut url = Url::parse(authority_host)
            .map_err(|e| ConfigError::invalid("AZURE_AUTHORITY_HOST", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "AZURE_AUTHORITY_HOST",
                "must start with http:// or https://",
            ));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.authority_host = url;
        Ok(self)
    }

    /// Share an existing HTTP client
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Tenant the credential authenticates against
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Client id of the app registration
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Authority base URL, always ending in `/`
    pub fn authority_host(&self) -> &Url {
        &self.authority_host
    }

    /// `{authority}/{tenant}/oauth2/v2.0/token`
    pub fn token_endpoint(&self) -> Result<Url, CredentialError> {
        self.authority_host
            .join(&format!("{}/oauth2/v2.0/token", self.tenant_id))
            .map_err(|e| CredentialError::InvalidResponse(format!("bad token endpoint: {e}")))
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    #[tracing::instrument(skip(self), fields(tenant_id = %self.tenant_id, client_id = %self.client_id))]
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        let endpoint = self.token_endpoint()?;
        let scope = scopes.join(" ");

        debug!(endpoint = %endpoint, "Requesting client credentials token");

        let response = self
            .http
            .post(endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send token request");
                CredentialError::Network(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let sanitized_body = sanitize_response_for_logging(&body);
            error!(status = %status, body = %sanitized_body, "Token request failed");
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => format!("HTTP {status}: {}", err.error),
                Err(_) => format!("HTTP {status}"),
            };
            return Err(CredentialError::AuthenticationFailed { reason });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %sanitize_response_for_logging(&body), "Failed to parse token response");
            CredentialError::InvalidResponse(e.to_string())
        })?;

        debug!(expires_in = ?token.expires_in, "Token acquired");

        let mut access = AccessToken::bearer(token.access_token);
        if let Some(expires_in) = token.expires_in {
            access = access.with_expiration(SystemTime::now() + Duration::from_secs(expires_in));
        }
        Ok(access)
    }
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("authority_host", &self.authority_host.as_str())
            .finish()
    }
}

fn validate_tenant_id(tenant_id: &str) -> Result<(), ConfigError> {
    let valid = !tenant_id.is_empty()
        && tenant_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "AZURE_TENANT_ID",
            "may only contain alphanumeric characters, '-' and '.'",
        ))
    }
}

/// Truncate a response body and redact token-looking fields before logging
fn sanitize_response_for_logging(body: &str) -> String {
    let truncated = if body.len() > MAX_ERROR_BODY_LOG_LENGTH {
        let cut = (0..=MAX_ERROR_BODY_LOG_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!(
            "{}... [truncated, {} total bytes]",
            &body[..cut],
            body.len()
        )
    } else {
        body.to_string()
    };

    if let Ok(mut json) = serde_json::from_str::<serde_json::Value>(&truncated) {
        for field in ["access_token", "refresh_token", "id_token", "client_secret"] {
            if json.get(field).is_some() {
                json[field] = serde_json::json!("[REDACTED]");
            }
        }
        json.to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> ClientSecretCredential {
        ClientSecretCredential::new("contoso.onmicrosoft.com", "client", SecureString::new("s3cr3t"))
            .expect("valid tenant")
    }

    #[test]
    fn test_token_endpoint_for_public_cloud() {
        let endpoint = credential().token_endpoint().unwrap();
        assert_eq!(
            endpoint.as_str(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_authority_host_gets_trailing_slash() {
        let cred = credential()
            .with_authority_host("https://login.chinacloudapi.cn/base")
            .unwrap();
        assert_eq!(
            cred.token_endpoint().unwrap().as_str(),
            "https://login.chinacloudapi.cn/base/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_authority_host_rejects_other_schemes() {
        let err = credential()
            .with_authority_host("ftp://login.example.com")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_tenant_id_rejects_path_characters() {
        let err = ClientSecretCredential::new("../evil", "client", SecureString::new("x"))
            .unwrap_err();
        assert!(err.to_string().contains("AZURE_TENANT_ID"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", credential());
        assert!(rendered.contains("contoso.onmicrosoft.com"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn test_sanitize_redacts_tokens() {
        let body = r#"{"access_token":"eyJ0eXAi","token_type":"Bearer"}"#;
        let sanitized = sanitize_response_for_logging(body);
        assert!(sanitized.contains("[REDACTED]"));
        assert!(!sanitized.contains("eyJ0eXAi"));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(MAX_ERROR_BODY_LOG_LENGTH + 100);
        let sanitized = sanitize_response_for_logging(&body);
        assert!(sanitized.contains("truncated"));
        assert!(sanitized.len() < body.len());
    }
}
