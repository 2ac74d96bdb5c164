//! Authentication helpers used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by
//! concentrating bearer extraction, subject verification, and ownership
//! checks here. Listings distinguish "no credential" (public-read
//! fallback) from "credential invalid" (rejection), so extraction and
//! verification are separate steps.

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use tracing::error;

use crate::domain::ports::{IdentityVerificationError, IdentityVerifier};
use crate::domain::{Entity, Error, OwnerId, Stored};

use super::ApiResult;

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestIdentity {
    /// No credential was supplied.
    Anonymous,
    /// A credential was supplied and verified.
    Subject(OwnerId),
}

fn bearer_token(req: &HttpRequest) -> ApiResult<Option<&str>> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("authorization scheme must be Bearer"))?;
    Ok(Some(token))
}

/// Resolve the request's identity.
///
/// An absent credential is [`RequestIdentity::Anonymous`]; a present but
/// unverifiable credential is an error, never silently downgraded.
///
/// # Errors
/// `Unauthorized` for rejected credentials, `ServiceUnavailable` when the
/// verifier cannot be reached.
pub async fn identify(
    req: &HttpRequest,
    verifier: &dyn IdentityVerifier,
) -> ApiResult<RequestIdentity> {
    let Some(token) = bearer_token(req)? else {
        return Ok(RequestIdentity::Anonymous);
    };

    match verifier.verify(token).await {
        Ok(subject) => Ok(RequestIdentity::Subject(subject)),
        Err(IdentityVerificationError::TokenInvalid { .. }) => {
            Err(Error::unauthorized("invalid bearer credential"))
        }
        Err(failure @ IdentityVerificationError::Unavailable { .. }) => {
            error!(error = %failure, "identity verification unavailable");
            Err(Error::service_unavailable("identity verification unavailable"))
        }
    }
}

/// Resolve the request's subject, rejecting anonymous requests.
///
/// # Errors
/// `Unauthorized` when no credential is supplied or it fails verification.
pub async fn require_subject(
    req: &HttpRequest,
    verifier: &dyn IdentityVerifier,
) -> ApiResult<OwnerId> {
    match identify(req, verifier).await? {
        RequestIdentity::Subject(subject) => Ok(subject),
        RequestIdentity::Anonymous => Err(Error::unauthorized("bearer credential required")),
    }
}

/// Reject access to an entity owned by a different subject.
///
/// # Errors
/// `Forbidden` when the entity's owner is not the given subject.
pub fn ensure_owned_by<E: Entity>(stored: &Stored<E>, subject: &OwnerId) -> ApiResult<()> {
    if stored.entity.owner() == Some(subject) {
        Ok(())
    } else {
        Err(Error::forbidden("entity is owned by another user"))
    }
}
