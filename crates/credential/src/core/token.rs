use crate::core::SecureString;
use std::time::{Duration, SystemTime};

/// Bearer token with its expiry
#[derive(Clone)]
pub struct AccessToken {
    /// The token value
    pub token: SecureString,

    /// When the token expires (if the endpoint said so)
    pub expires_at: Option<SystemTime>,
}

impl AccessToken {
    /// Create a new bearer token without expiry
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: SecureString::new(token),
            expires_at: None,
        }
    }

    /// Create with expiration
    pub fn with_expiration(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Time left before expiry
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at
            .and_then(|exp| exp.duration_since(SystemTime::now()).ok())
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= SystemTime::now())
    }

    /// Value for an `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token.expose())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
