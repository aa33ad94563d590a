//! Authenticator backed by a fixed token table.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::approval::{
    domain::{Identity, Principal},
    ports::{AuthenticationError, Authenticator, Credentials},
};

/// Authenticator that accepts a fixed set of access tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenAuthenticator {
    /// Creates an authenticator that accepts no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as proof of `identity`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, AuthenticationError> {
        if credentials.access_token.trim().is_empty() {
            return Err(AuthenticationError::MissingToken);
        }
        self.tokens
            .get(&credentials.access_token)
            .cloned()
            .map(Principal::new)
            .ok_or(AuthenticationError::InvalidCredentials)
    }
}
