//! Error types for credential resolution and token acquisition
//!
//! - [`ConfigError`]: a required setting is missing or malformed. Raised before
//!   any network call and never retried.
//! - [`CredentialError`]: the identity endpoint could not produce a token.
//!
//! ```
//! use azsecrets_credential::ConfigError;
//!
//! let err = ConfigError::MissingIdentity { variable: "AZURE_TENANT_ID" };
//! assert!(err.to_string().starts_with("missing identity configuration"));
//! ```

use thiserror::Error;

/// Missing or malformed configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// One of the identity variables is absent or empty
    #[error("missing identity configuration: {variable} is not set")]
    MissingIdentity {
        /// The first variable found missing
        variable: &'static str,
    },

    /// The connection string variable is absent or empty
    #[error("missing connection string: {variable} is not set")]
    MissingConnectionString {
        /// The variable that was read
        variable: &'static str,
    },

    /// A value is present but unusable
    #[error("invalid configuration: {field}: {reason}")]
    InvalidValue {
        /// Setting name
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Token acquisition errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The identity endpoint rejected the request
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed {
        /// Status and error code reported by the endpoint
        reason: String,
    },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with something that is not a token
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identity_message() {
        let err = ConfigError::MissingIdentity {
            variable: "AZURE_CLIENT_SECRET",
        };
        assert_eq!(
            err.to_string(),
            "missing identity configuration: AZURE_CLIENT_SECRET is not set"
        );
    }

    #[test]
    fn test_missing_connection_string_message() {
        let err = ConfigError::MissingConnectionString {
            variable: "DB_CONNECTION_STRING",
        };
        assert!(err.to_string().starts_with("missing connection string"));
    }

    #[test]
    fn test_invalid_shorthand() {
        let err = ConfigError::invalid("AZURE_AUTHORITY_HOST", "not a URL");
        assert_eq!(
            err.to_string(),
            "invalid configuration: AZURE_AUTHORITY_HOST: not a URL"
        );
    }

    #[test]
    fn test_authentication_failed_message() {
        let err = CredentialError::AuthenticationFailed {
            reason: "HTTP 401 Unauthorized: invalid_client".to_string(),
        };
        assert!(err.to_string().contains("invalid_client"));
    }
}
