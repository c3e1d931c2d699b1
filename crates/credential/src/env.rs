use std::collections::HashMap;

/// Tenant (directory) id of the app registration
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
/// Client (application) id of the app registration
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
/// Client secret of the app registration
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
/// Optional override of the Azure AD authority
pub const AZURE_AUTHORITY_HOST: &str = "AZURE_AUTHORITY_HOST";

/// Source of configuration variables.
///
/// Production code reads the process environment through [`ProcessEnv`];
/// tests hand in a plain map so nothing mutates global state.
pub trait EnvSource {
    /// Raw value of `name`, if set
    fn var(&self, name: &str) -> Option<String>;

    /// Value of `name`, treating the empty string as unset
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|v| !v.is_empty())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}
