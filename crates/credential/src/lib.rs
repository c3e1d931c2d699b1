//! Azure AD client-secret credentials.
//!
//! Resolves the tenant id, client id and client secret from the process
//! environment and exchanges them for bearer tokens with the OAuth2
//! client-credentials grant.
//!
//! ```rust,no_run
//! use azsecrets_credential::{ProcessEnv, TokenCredential, resolve_credential};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credential = resolve_credential(&ProcessEnv)?;
//! let token = credential
//!     .get_token(&["https://vault.azure.net/.default"])
//!     .await?;
//! assert!(!token.is_expired());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

/// Core types, errors, and primitives
pub mod core;
/// Environment access
pub mod env;

mod client_secret;
mod resolver;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use crate::client_secret::{ClientSecretCredential, DEFAULT_AUTHORITY_HOST, TokenCredential};
pub use crate::core::{AccessToken, ConfigError, CredentialError, SecureString};
pub use crate::env::{EnvSource, ProcessEnv};
pub use crate::resolver::resolve_credential;

/// Commonly used types and traits
pub mod prelude {
    pub use crate::core::{AccessToken, ConfigError, CredentialError, SecureString};
    pub use crate::env::{EnvSource, ProcessEnv};
    pub use crate::{ClientSecretCredential, TokenCredential, resolve_credential};
}
