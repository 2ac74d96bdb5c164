//! Port for the external document store.
//!
//! The store provides key-addressed get/put/delete, kind-scoped queries
//! with at most one equality filter and cursor pagination, and transactions
//! with get/save/commit/rollback. Expected absence is `Ok(None)`; only
//! transport or infrastructure faults surface as errors.

use async_trait::async_trait;
use pagination::{Cursor, Page};
use serde_json::Value;

use crate::domain::entity::{Document, EntityKey, KeySpec, Kind, StoredDocument};

use super::define_port_error;

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// Transport or infrastructure fault in the store backend.
        Backend { message: String } =>
            "document store backend failure: {message}",
        /// Stored payload could not be encoded or decoded.
        Serialization { message: String } =>
            "document store serialization failed: {message}",
        /// A continuation cursor was malformed or issued for another query.
        Cursor { message: String } =>
            "continuation cursor is not usable: {message}",
    }
}

/// Single field-equals-value predicate for kind queries.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    /// Field name inside the entity document.
    pub field: &'static str,
    /// Value the field must equal exactly.
    pub value: Value,
}

/// Kind-scoped query with an optional filter and continuation cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct KindQuery {
    /// Kind whose entities are listed.
    pub kind: Kind,
    /// Optional equality filter; at most one per query.
    pub filter: Option<PropertyFilter>,
    /// Maximum number of entities returned per page.
    pub page_size: usize,
    /// Resume point from a previous page, if any.
    pub cursor: Option<Cursor>,
}

/// Port for the external document store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist field data, allocating a numeric key or writing at the
    /// supplied key (overwrite semantics for existing keys).
    async fn put(
        &self,
        kind: Kind,
        spec: KeySpec,
        fields: Document,
    ) -> Result<EntityKey, DocumentStoreError>;

    /// Fetch by key, attaching the resolved key to the returned value.
    async fn get(
        &self,
        kind: Kind,
        key: &EntityKey,
    ) -> Result<Option<StoredDocument>, DocumentStoreError>;

    /// Remove by key. Callers check prior existence themselves.
    async fn delete(&self, kind: Kind, key: &EntityKey) -> Result<(), DocumentStoreError>;

    /// Run a kind-scoped query returning at most one page of matching
    /// entities in the store's natural key order.
    ///
    /// The page's cursor resumes after its final entity and is absent on
    /// the last page — never a cursor that would yield zero further
    /// entities.
    async fn query(
        &self,
        query: KindQuery,
    ) -> Result<Page<StoredDocument>, DocumentStoreError>;

    /// Open a transaction serialising read-modify-write sequences.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, DocumentStoreError>;
}

/// In-flight store transaction.
///
/// Writes are staged until [`StoreTransaction::commit`]; rolling back (or
/// dropping) discards them.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Read a document inside the transaction, seeing staged writes.
    async fn get(
        &mut self,
        kind: Kind,
        key: &EntityKey,
    ) -> Result<Option<StoredDocument>, DocumentStoreError>;

    /// Stage a write at an exact key.
    async fn save(
        &mut self,
        kind: Kind,
        key: EntityKey,
        fields: Document,
    ) -> Result<(), DocumentStoreError>;

    /// Apply all staged writes atomically.
    async fn commit(self: Box<Self>) -> Result<(), DocumentStoreError>;

    /// Discard all staged writes.
    async fn rollback(self: Box<Self>) -> Result<(), DocumentStoreError>;
}
