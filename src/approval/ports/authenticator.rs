//! Authenticator port mapping request credentials to a verified principal.

use crate::approval::domain::Principal;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Session credentials presented with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Short-lived access token.
    pub access_token: String,
    /// Refresh token, when the caller holds one.
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Creates credentials from an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Identity verification contract.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves credentials to a verified principal.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the credentials are not accepted
    /// or the authenticator cannot be reached.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, AuthenticationError>;
}

/// Errors returned by authenticator implementations.
#[derive(Debug, Clone, Error)]
pub enum AuthenticationError {
    /// No access token was supplied.
    #[error("missing access token")]
    MissingToken,

    /// The credentials were rejected.
    #[error("invalid or expired credentials")]
    InvalidCredentials,

    /// The authenticator failed.
    #[error("authenticator unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuthenticationError {
    /// Wraps an authenticator failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
