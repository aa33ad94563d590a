//! Credential verification ahead of approval operations.

use super::ApprovalServiceResult;
use crate::approval::{
    domain::Principal,
    ports::{Authenticator, Credentials},
};
use std::sync::Arc;

/// Resolves request credentials to a verified principal.
#[derive(Clone)]
pub struct SessionVerifier<A>
where
    A: Authenticator,
{
    authenticator: Arc<A>,
}

impl<A> SessionVerifier<A>
where
    A: Authenticator,
{
    /// Creates a verifier over `authenticator`.
    #[must_use]
    pub const fn new(authenticator: Arc<A>) -> Self {
        Self { authenticator }
    }

    /// Verifies `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`super::ApprovalServiceError::Unauthenticated`] when the
    /// authenticator rejects the credentials or is unavailable.
    pub async fn verify(&self, credentials: &Credentials) -> ApprovalServiceResult<Principal> {
        let principal = self
            .authenticator
            .authenticate(credentials)
            .await
            .inspect_err(|err| tracing::debug!(error = %err, "session verification failed"))?;
        tracing::debug!(principal = %principal, "session verified");
        Ok(principal)
    }
}
