use tracing::debug;

use crate::client_secret::ClientSecretCredential;
use crate::core::{ConfigError, SecureString};
use crate::env::{
    AZURE_AUTHORITY_HOST, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET, AZURE_TENANT_ID, EnvSource,
};

/// Build a [`ClientSecretCredential`] from `AZURE_TENANT_ID`,
/// `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`.
///
/// All three must be set and non-empty; otherwise this fails with
/// [`ConfigError::MissingIdentity`] and nothing is contacted.
/// `AZURE_AUTHORITY_HOST` optionally replaces the public-cloud authority.
pub fn resolve_credential(env: &impl EnvSource) -> Result<ClientSecretCredential, ConfigError> {
    let tenant_id = required(env, AZURE_TENANT_ID)?;
    let client_id = required(env, AZURE_CLIENT_ID)?;
    let client_secret = required(env, AZURE_CLIENT_SECRET)?;

    let mut credential =
        ClientSecretCredential::new(tenant_id, client_id, SecureString::new(client_secret))?;

    if let Some(authority) = env.non_empty(AZURE_AUTHORITY_HOST) {
        credential = credential.with_authority_host(&authority)?;
    }

    debug!(
        tenant_id = %credential.tenant_id(),
        client_id = %credential.client_id(),
        "Resolved client secret credential"
    );

    Ok(credential)
}

fn required(env: &impl EnvSource, variable: &'static str) -> Result<String, ConfigError> {
    env.non_empty(variable)
        .ok_or(ConfigError::MissingIdentity { variable })
}
