//! Entity identity primitives shared across kinds.
//!
//! Entities cross the store port as raw [`Document`] field maps; typed kind
//! structs convert to and from documents at the domain boundary. The store
//! key never lives inside a document: adapters attach it at read time as
//! [`StoredDocument::key`] and callers strip it implicitly by persisting
//! `fields` alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::OwnerId;
use super::validation::{self, ValidationReport};

/// Raw field data for one persisted entity, keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Closed set of entity kinds known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// A vessel owned by one subject.
    Boat,
    /// Cargo optionally carried by a boat.
    Load,
    /// A registered API user, keyed by subject id.
    User,
    /// Per-kind running count record.
    Counter,
}

impl Kind {
    /// Kind name as stored and queried.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boat => "Boat",
            Self::Load => "Load",
            Self::User => "User",
            Self::Counter => "Counter",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store key of a persisted entity.
///
/// Boats and loads use store-allocated numeric ids; users and counters use
/// caller-supplied names. Ordering follows the store's natural key order,
/// which is also its insertion order for allocated ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKey {
    /// Store-allocated numeric id.
    Id(i64),
    /// Caller-supplied name key.
    Name(String),
}

impl EntityKey {
    /// Numeric id, when this key is id-shaped.
    pub const fn id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// How a put keys the written entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    /// Allocate a fresh numeric id.
    Auto,
    /// Write at this exact key, overwriting any previous value.
    Existing(EntityKey),
}

/// One entity as returned by the store, with its resolved key attached at
/// read time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Resolved store key.
    pub key: EntityKey,
    /// Persisted field data.
    pub fields: Document,
}

/// Shared behaviour each concrete kind implements.
///
/// Dispatch over kinds is closed: the lifecycle manager is generic over
/// this trait and the [`Kind`] enum routes storage and validation, so
/// adding a kind means adding a struct, an impl, and a rule table entry.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Kind tag for store routing and validation rule lookup.
    const KIND: Kind;

    /// Field names a partial update may overwrite.
    const EDITABLE: &'static [&'static str];

    /// Rebuild a typed instance from raw field data, running the kind's
    /// validation rules first.
    ///
    /// # Errors
    /// Returns the [`ValidationReport`] produced by the kind's rule table
    /// when the data is unset or out of bounds.
    fn from_document(fields: &Document) -> Result<Self, ValidationReport>;

    /// Field data to persist. Never includes the store key.
    fn to_document(&self) -> Document;

    /// Key handling for the first write of this instance.
    fn key_spec(&self) -> KeySpec;

    /// Owning subject, when the kind is owner-scoped.
    fn owner(&self) -> Option<&OwnerId>;

    /// Run the kind's validation rules over this instance's field data.
    ///
    /// # Errors
    /// Returns the [`ValidationReport`] naming the failing field and rule.
    fn validate(&self) -> Result<(), ValidationReport> {
        validation::validate(Self::KIND, &self.to_document())
    }
}

/// Extract a string field from a validated document.
///
/// The rule tables guarantee presence and type by the time kinds decode, so
/// the error path only fires on corrupt store data.
pub(crate) fn require_str(
    kind: Kind,
    fields: &Document,
    field: &'static str,
) -> Result<String, ValidationReport> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ValidationReport::unset(kind, fields.clone(), field))
}

/// Extract an integer field from a validated document.
pub(crate) fn require_i64(
    kind: Kind,
    fields: &Document,
    field: &'static str,
) -> Result<i64, ValidationReport> {
    fields
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| ValidationReport::unset(kind, fields.clone(), field))
}
