//! Port for the external identity provider.
//!
//! Token issuance, JWKS retrieval, and signature verification live in the
//! provider; the domain consumes a single "verify bearer credential →
//! subject id" operation.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::user::OwnerId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity verifier adapters.
    pub enum IdentityVerificationError {
        /// The credential failed signature or claim checks.
        TokenInvalid { message: String } =>
            "bearer credential rejected: {message}",
        /// The verifier backend could not be reached.
        Unavailable { message: String } =>
            "identity verifier unavailable: {message}",
    }
}

/// Port mapping a bearer credential to a stable subject identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a bearer credential and return the subject it identifies.
    async fn verify(&self, credential: &str) -> Result<OwnerId, IdentityVerificationError>;
}

/// Static verifier for development and tests: a fixed token → subject map.
#[derive(Debug, Default, Clone)]
pub struct FixtureIdentityVerifier {
    subjects: HashMap<String, OwnerId>,
}

impl FixtureIdentityVerifier {
    /// Build an empty verifier that rejects every credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token that verifies to the given subject.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, subject: OwnerId) -> Self {
        self.subjects.insert(token.into(), subject);
        self
    }
}

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<OwnerId, IdentityVerificationError> {
        self.subjects
            .get(credential)
            .cloned()
            .ok_or_else(|| IdentityVerificationError::token_invalid("unknown bearer token"))
    }
}
