//! Entity lifecycle orchestration.
//!
//! Each mutation runs its steps strictly in sequence and fails fast:
//! validate, then persist, then count. A counter adjustment that fails
//! after a successful entity write is logged and left as drift rather than
//! undoing the write; entity correctness is prioritised over counter
//! exactness.

use std::sync::Arc;

use pagination::{Cursor, Page};
use serde_json::Value;
use tracing::error;

use super::counters::CounterLedger;
use super::entity::{Document, Entity, EntityKey, KeySpec, StoredDocument};
use super::error::Error;
use super::ports::{DocumentStore, DocumentStoreError, KindQuery, PropertyFilter};
use super::user::OwnerId;
use super::validation::ValidationReport;

/// System-wide page size for kind listings. Not caller-configurable.
pub const PAGE_SIZE: usize = 5;

/// A persisted entity with the key the store resolved at read time.
///
/// The key is transient: persisting always writes `entity`'s fields alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<E> {
    /// Store key attached by the adapter.
    pub key: EntityKey,
    /// Decoded entity data.
    pub entity: E,
}

impl<E> Stored<E> {
    /// Numeric id, when the kind uses allocated ids.
    pub const fn id(&self) -> Option<i64> {
        self.key.id()
    }
}

/// One listing page plus the exact kind total from the counter ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPage<E> {
    /// Decoded entities in store key order, with the continuation cursor.
    pub page: Page<Stored<E>>,
    /// Exact count for the kind, owner-scoped when the listing was.
    pub total: u64,
}

/// Orchestrates validation, persistence, and counting for entity mutations.
pub struct EntityLifecycle {
    store: Arc<dyn DocumentStore>,
    counters: Arc<CounterLedger>,
}

impl EntityLifecycle {
    /// Build a lifecycle manager over the given store and counter ledger.
    pub fn new(store: Arc<dyn DocumentStore>, counters: Arc<CounterLedger>) -> Self {
        Self { store, counters }
    }

    /// Map a store failure into the domain taxonomy, logging it once here.
    ///
    /// Malformed continuation cursors are the caller's mistake; everything
    /// else is an opaque internal failure.
    fn map_store_error(failure: DocumentStoreError) -> Error {
        match failure {
            DocumentStoreError::Cursor { message } => {
                Error::invalid_request(format!("pagination cursor rejected: {message}"))
            }
            other => {
                error!(error = %other, "document store failure");
                Error::internal("storage operation failed")
            }
        }
    }

    fn map_validation(report: &ValidationReport) -> Error {
        Error::invalid_request(report.to_string()).with_details(report.to_details())
    }

    fn decode_stored<E: Entity>(stored: StoredDocument) -> Result<Stored<E>, Error> {
        match E::from_document(&stored.fields) {
            Ok(entity) => Ok(Stored {
                key: stored.key,
                entity,
            }),
            Err(report) => {
                error!(
                    kind = %E::KIND,
                    key = %stored.key,
                    error = %report,
                    "persisted entity failed decoding"
                );
                Err(Error::internal("stored entity is corrupt"))
            }
        }
    }

    /// Validate, persist, count, and return the canonical persisted form.
    ///
    /// A failed validation touches neither store nor counters; a failed
    /// persist leaves the counters untouched as well, so they stay
    /// consistent with what was actually written.
    ///
    /// # Errors
    /// `ValidationError` for rejected field data, `StorageFailure` for
    /// store faults.
    pub async fn create<E: Entity>(&self, candidate: E) -> Result<Stored<E>, Error> {
        candidate
            .validate()
            .map_err(|report| Self::map_validation(&report))?;

        let key = self
            .store
            .put(E::KIND, candidate.key_spec(), candidate.to_document())
            .await
            .map_err(Self::map_store_error)?;

        if let Err(failure) = self.counters.adjust(E::KIND, candidate.owner(), 1).await {
            error!(
                error = %failure,
                kind = %E::KIND,
                key = %key,
                "counter increment failed after entity create"
            );
        }

        self.fetch::<E>(&key).await
    }

    /// Fetch the canonical persisted form by key.
    ///
    /// # Errors
    /// `NotFound` when no entity lives at the key.
    pub async fn fetch<E: Entity>(&self, key: &EntityKey) -> Result<Stored<E>, Error> {
        let stored = self
            .store
            .get(E::KIND, key)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Error::not_found(format!("no {} with id {key}", E::KIND)))?;
        Self::decode_stored(stored)
    }

    /// List one page of a kind, optionally scoped to an owner, with the
    /// exact total from the counter ledger.
    ///
    /// # Errors
    /// `ValidationError` for malformed cursors, `StorageFailure` otherwise.
    pub async fn list<E: Entity>(
        &self,
        owner: Option<&OwnerId>,
        cursor: Option<Cursor>,
    ) -> Result<EntityPage<E>, Error> {
        let filter = owner.map(|scope| PropertyFilter {
            field: "user",
            value: Value::String(scope.as_str().to_owned()),
        });

        let raw = self
            .store
            .query(KindQuery {
                kind: E::KIND,
                filter,
                page_size: PAGE_SIZE,
                cursor,
            })
            .await
            .map_err(Self::map_store_error)?;

        let total = self
            .counters
            .read(E::KIND, owner)
            .await
            .map_err(Self::map_store_error)?;

        let items = raw
            .items
            .into_iter()
            .map(Self::decode_stored)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EntityPage {
            page: Page::new(items, raw.next_cursor),
            total,
        })
    }

    /// Merge editable fields into the existing entity, re-validate the
    /// whole record, and persist at the existing key.
    ///
    /// Only fields in the kind's editable set are taken from `changes`;
    /// everything else in the patch is ignored. No counter change:
    /// ownership and existence are unchanged.
    ///
    /// # Errors
    /// `ValidationError` when the merged record fails full validation.
    pub async fn update<E: Entity>(
        &self,
        existing: &Stored<E>,
        changes: &Document,
    ) -> Result<Stored<E>, Error> {
        let mut merged = existing.entity.to_document();
        for field in E::EDITABLE {
            if let Some(value) = changes.get(*field) {
                merged.insert((*field).to_owned(), value.clone());
            }
        }

        let fresh = E::from_document(&merged).map_err(|report| Self::map_validation(&report))?;

        self.store
            .put(
                E::KIND,
                KeySpec::Existing(existing.key.clone()),
                fresh.to_document(),
            )
            .await
            .map_err(Self::map_store_error)?;

        self.fetch::<E>(&existing.key).await
    }

    /// Replace every field with the fully validated replacement, keeping
    /// the existing key. No counter change.
    ///
    /// # Errors
    /// `ValidationError` when the replacement fails validation.
    pub async fn replace<E: Entity>(
        &self,
        existing: &Stored<E>,
        replacement: E,
    ) -> Result<Stored<E>, Error> {
        replacement
            .validate()
            .map_err(|report| Self::map_validation(&report))?;

        self.store
            .put(
                E::KIND,
                KeySpec::Existing(existing.key.clone()),
                replacement.to_document(),
            )
            .await
            .map_err(Self::map_store_error)?;

        self.fetch::<E>(&existing.key).await
    }

    /// Delete by key and decrement the kind's counter.
    ///
    /// A decrement failure after a successful delete is logged and
    /// accepted as drift; the delete stands.
    ///
    /// # Errors
    /// `StorageFailure` when the delete itself fails.
    pub async fn destroy<E: Entity>(&self, existing: &Stored<E>) -> Result<(), Error> {
        self.store
            .delete(E::KIND, &existing.key)
            .await
            .map_err(Self::map_store_error)?;

        if let Err(failure) = self
            .counters
            .adjust(E::KIND, existing.entity.owner(), -1)
            .await
        {
            error!(
                error = %failure,
                kind = %E::KIND,
                key = %existing.key,
                "counter decrement failed after entity delete"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
