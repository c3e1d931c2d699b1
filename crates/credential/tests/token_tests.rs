//! Token acquisition against a mocked Azure AD endpoint

use std::collections::HashMap;
use std::time::Duration;

use azsecrets_credential::{
    ClientSecretCredential, CredentialError, SecureString, TokenCredential, resolve_credential,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VAULT_SCOPE: &str = "https://vault.azure.net/.default";

fn credential_for(server: &MockServer) -> ClientSecretCredential {
    ClientSecretCredential::new("tenant-1", "client-1", SecureString::new("secret-1"))
        .unwrap()
        .with_authority_host(&server.uri())
        .unwrap()
}

#[tokio::test]
async fn client_credentials_grant_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=secret-1"))
        .and(body_string_contains("scope=https%3A%2F%2Fvault.azure.net%2F.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "ext_expires_in": 3599,
            "access_token": "eyJ0eXAiOiJKV1QiLCJhbGciOi"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = credential_for(&server)
        .get_token(&[VAULT_SCOPE])
        .await
        .expect("token request should succeed");

    assert_eq!(token.token.expose(), "eyJ0eXAiOiJKV1QiLCJhbGciOi");
    assert!(!token.is_expired());
    let ttl = token.ttl().expect("expiry should be set");
    assert!(ttl > Duration::from_secs(3500));
}

#[tokio::test]
async fn rejected_secret_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    let err = credential_for(&server)
        .get_token(&[VAULT_SCOPE])
        .await
        .unwrap_err();

    match err {
        CredentialError::AuthenticationFailed { reason } => {
            assert!(reason.contains("401"));
            assert!(reason.contains("invalid_client"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_token_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = credential_for(&server)
        .get_token(&[VAULT_SCOPE])
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::InvalidResponse(_)));
}

#[tokio::test]
async fn missing_identity_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let env = HashMap::from([
        ("AZURE_TENANT_ID".to_string(), "tenant-1".to_string()),
        ("AZURE_CLIENT_ID".to_string(), "client-1".to_string()),
        ("AZURE_AUTHORITY_HOST".to_string(), server.uri()),
    ]);

    assert!(resolve_credential(&env).is_err());
    server.verify().await;
}
