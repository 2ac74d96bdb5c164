//! Domain ports for the hexagonal boundary.
//!
//! Ports describe how the domain reaches its driven collaborators: the
//! document store and the identity provider. Each trait exposes strongly
//! typed errors so adapters map their failures into predictable variants
//! instead of returning `anyhow::Result`.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod identity_verifier;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    DocumentStore, DocumentStoreError, KindQuery, PropertyFilter, StoreTransaction,
};
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{FixtureIdentityVerifier, IdentityVerificationError, IdentityVerifier};
