use secrecy::{ExposeSecret, SecretString};

/// Secure string that zeros memory on drop
#[derive(Clone)]
pub struct SecureString(SecretString);

impl SecureString {
    /// Create new secure string
    pub fn new(s: impl Into<String>) -> Self {
        Self(SecretString::from(s.into()))
    }

    /// Expose the secret (use with caution)
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString[REDACTED]")
    }
}
