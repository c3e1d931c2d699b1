//! Test doubles for code that needs a [`TokenCredential`]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::TokenCredential;
use crate::core::{AccessToken, CredentialError};

/// Hands out the same token every time and counts requests
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: String,
    requests: Arc<AtomicU32>,
}

impl StaticTokenCredential {
    /// Credential that always returns `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            requests: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of `get_token` calls so far
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::bearer(self.token.clone()))
    }
}
