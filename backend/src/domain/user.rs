//! User identity model.
//!
//! Subjects are issued by the external identity provider; the id is opaque
//! here. A registered [`User`] is keyed in the store by its subject id, so
//! re-registration overwrites rather than duplicates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{self, Document, Entity, EntityKey, KeySpec, Kind};
use super::validation::{self, ValidationReport};

/// Validation errors returned by [`OwnerId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerIdError {
    /// Subject id is empty.
    #[error("subject id must not be empty")]
    Empty,
    /// Subject id carries leading or trailing whitespace.
    #[error("subject id must not contain surrounding whitespace")]
    Padded,
}

/// Stable subject identifier issued by the identity provider.
///
/// Opaque by contract: no UUID or other shape is assumed beyond being a
/// non-empty, trimmed string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Validate and construct an [`OwnerId`].
    ///
    /// # Errors
    /// Rejects empty or whitespace-padded input.
    pub fn new(id: impl Into<String>) -> Result<Self, OwnerIdError> {
        let raw = id.into();
        if raw.is_empty() {
            return Err(OwnerIdError::Empty);
        }
        if raw.trim() != raw {
            return Err(OwnerIdError::Padded);
        }
        Ok(Self(raw))
    }

    /// Borrow the subject id text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = OwnerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Registered API user.
///
/// ## Invariants
/// - `sub` is the store key, so saving an existing user overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Provider-issued subject id, also the store key.
    pub sub: OwnerId,
}

impl User {
    /// Build a user around a verified subject id.
    pub const fn new(sub: OwnerId) -> Self {
        Self { sub }
    }
}

impl Entity for User {
    const KIND: Kind = Kind::User;
    const EDITABLE: &'static [&'static str] = &[];

    fn from_document(fields: &Document) -> Result<Self, ValidationReport> {
        validation::validate(Kind::User, fields)?;
        let raw = entity::require_str(Kind::User, fields, "user")?;
        let sub = OwnerId::new(raw)
            .map_err(|_| ValidationReport::rule_failed(Kind::User, fields.clone(), "user", 1))?;
        Ok(Self { sub })
    }

    fn to_document(&self) -> Document {
        let mut fields = Document::new();
        fields.insert(
            "user".to_owned(),
            serde_json::Value::String(self.sub.as_str().to_owned()),
        );
        fields
    }

    fn key_spec(&self) -> KeySpec {
        KeySpec::Existing(EntityKey::Name(self.sub.as_str().to_owned()))
    }

    // Users carry no per-owner breakdown in the counter record; the kind
    // total alone tracks registrations.
    fn owner(&self) -> Option<&OwnerId> {
        None
    }
}
