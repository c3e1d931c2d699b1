//! Resolving the identity settings from an environment map

use std::collections::HashMap;

use azsecrets_credential::{ConfigError, resolve_credential};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn full_env() -> HashMap<String, String> {
    HashMap::from([
        ("AZURE_TENANT_ID".to_string(), "tenant-1".to_string()),
        ("AZURE_CLIENT_ID".to_string(), "client-1".to_string()),
        ("AZURE_CLIENT_SECRET".to_string(), "secret-1".to_string()),
    ])
}

#[test]
fn resolves_all_three_values() {
    let credential = resolve_credential(&full_env()).expect("complete env should resolve");
    assert_eq!(credential.tenant_id(), "tenant-1");
    assert_eq!(credential.client_id(), "client-1");
    assert_eq!(
        credential.authority_host().as_str(),
        "https://login.microsoftonline.com/"
    );
}

#[rstest]
#[case::tenant_absent("AZURE_TENANT_ID", None)]
#[case::tenant_empty("AZURE_TENANT_ID", Some(""))]
#[case::client_absent("AZURE_CLIENT_ID", None)]
#[case::client_empty("AZURE_CLIENT_ID", Some(""))]
#[case::secret_absent("AZURE_CLIENT_SECRET", None)]
#[case::secret_empty("AZURE_CLIENT_SECRET", Some(""))]
fn missing_identity_value_fails(#[case] variable: &'static str, #[case] value: Option<&str>) {
    let mut env = full_env();
    match value {
        Some(v) => {
            env.insert(variable.to_string(), v.to_string());
        }
        None => {
            env.remove(variable);
        }
    }

    let err = resolve_credential(&env).unwrap_err();
    assert_eq!(err, ConfigError::MissingIdentity { variable });
    assert!(err.to_string().starts_with("missing identity configuration"));
}

#[test]
fn authority_host_override_is_applied() {
    let mut env = full_env();
    env.insert(
        "AZURE_AUTHORITY_HOST".to_string(),
        "https://login.microsoftonline.us".to_string(),
    );

    let credential = resolve_credential(&env).unwrap();
    assert_eq!(
        credential.token_endpoint().unwrap().as_str(),
        "https://login.microsoftonline.us/tenant-1/oauth2/v2.0/token"
    );
}

#[test]
fn malformed_authority_host_is_a_config_error() {
    let mut env = full_env();
    env.insert("AZURE_AUTHORITY_HOST".to_string(), "not a url".to_string());

    let err = resolve_credential(&env).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
