//! Transactional per-kind counter records.
//!
//! Counts are maintained out-of-band from the query path so listings can
//! report an exact total without a table scan. The read-modify-write of a
//! counter record inside one store transaction is the only place
//! concurrent creates and deletes on the same kind are serialised.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::entity::{Document, EntityKey, Kind};
use super::ports::{DocumentStore, DocumentStoreError, StoreTransaction};
use super::user::OwnerId;

/// Kinds whose creation and deletion are counted.
pub const COUNTED_KINDS: [Kind; 3] = [Kind::Boat, Kind::Load, Kind::User];

/// Persisted running count for one kind.
///
/// ## Invariants
/// - `total` equals the sum of all per-owner counts whenever no adjustment
///   is in flight.
/// - Counts never go negative; decrements clamp at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Count across all owners.
    pub total: u64,
    /// Per-owner breakdown; absent owners count as zero.
    #[serde(default)]
    pub owners: BTreeMap<String, u64>,
}

impl CounterRecord {
    /// Apply a delta to the total and, when given, to one owner's count,
    /// both clamped at zero.
    pub fn apply(&mut self, owner: Option<&OwnerId>, delta: i64) {
        self.total = self.total.saturating_add_signed(delta);
        if let Some(owner) = owner {
            let count = self.owners.entry(owner.as_str().to_owned()).or_insert(0);
            *count = count.saturating_add_signed(delta);
        }
    }

    /// Owner count (zero when absent) or the total when no owner filter
    /// applies.
    pub fn value_for(&self, owner: Option<&OwnerId>) -> u64 {
        owner.map_or(self.total, |owner| {
            self.owners.get(owner.as_str()).copied().unwrap_or(0)
        })
    }
}

fn encode(record: &CounterRecord) -> Result<Document, DocumentStoreError> {
    let value = serde_json::to_value(record)
        .map_err(|err| DocumentStoreError::serialization(err.to_string()))?;
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(DocumentStoreError::serialization(
            "counter record did not encode as an object",
        )),
    }
}

fn decode(fields: &Document) -> Result<CounterRecord, DocumentStoreError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|err| DocumentStoreError::serialization(err.to_string()))
}

/// Maintains the per-kind counter records inside store transactions.
pub struct CounterLedger {
    store: Arc<dyn DocumentStore>,
}

impl CounterLedger {
    /// Build a ledger over the given store handle.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn record_key(kind: Kind) -> EntityKey {
        EntityKey::Name(kind.as_str().to_owned())
    }

    /// Roll back a transaction while preserving the original failure.
    async fn abort(
        tx: Box<dyn StoreTransaction>,
        error: DocumentStoreError,
    ) -> DocumentStoreError {
        if let Err(rollback_error) = tx.rollback().await {
            warn!(error = %rollback_error, "counter transaction rollback failed");
        }
        error
    }

    /// Create missing counter records with zero totals.
    ///
    /// Idempotent bootstrap: existing records are left untouched.
    ///
    /// # Errors
    /// Propagates store failures; the partially initialised kinds keep
    /// their committed records.
    pub async fn initialize(&self) -> Result<(), DocumentStoreError> {
        for kind in COUNTED_KINDS {
            let key = Self::record_key(kind);
            let mut tx = self.store.begin().await?;
            let existing = match tx.get(Kind::Counter, &key).await {
                Ok(existing) => existing,
                Err(error) => return Err(Self::abort(tx, error).await),
            };
            if existing.is_some() {
                tx.rollback().await?;
                continue;
            }
            let fields = match encode(&CounterRecord::default()) {
                Ok(fields) => fields,
                Err(error) => return Err(Self::abort(tx, error).await),
            };
            if let Err(error) = tx.save(Kind::Counter, key, fields).await {
                return Err(Self::abort(tx, error).await);
            }
            tx.commit().await?;
        }
        Ok(())
    }

    /// Atomically shift a kind's counters by `delta`.
    ///
    /// One transaction wraps the read, the clamped application to `total`
    /// (and the owner's entry when given), and the write back.
    ///
    /// # Errors
    /// Any mid-transaction failure rolls back and surfaces; the counter is
    /// never left partially updated.
    pub async fn adjust(
        &self,
        kind: Kind,
        owner: Option<&OwnerId>,
        delta: i64,
    ) -> Result<(), DocumentStoreError> {
        let key = Self::record_key(kind);
        let mut tx = self.store.begin().await?;
        let stored = match tx.get(Kind::Counter, &key).await {
            Ok(stored) => stored,
            Err(error) => return Err(Self::abort(tx, error).await),
        };
        let decoded = stored.as_ref().map(|current| decode(&current.fields));
        let mut record = match decoded.transpose() {
            Ok(record) => record.unwrap_or_default(),
            Err(error) => return Err(Self::abort(tx, error).await),
        };
        record.apply(owner, delta);
        let fields = match encode(&record) {
            Ok(fields) => fields,
            Err(error) => return Err(Self::abort(tx, error).await),
        };
        if let Err(error) = tx.save(Kind::Counter, key, fields).await {
            return Err(Self::abort(tx, error).await);
        }
        tx.commit().await
    }

    /// Read a kind's count, scoped to one owner when given.
    ///
    /// Opens a transaction and always rolls it back: the read mutates
    /// nothing, so there is nothing to commit.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn read(
        &self,
        kind: Kind,
        owner: Option<&OwnerId>,
    ) -> Result<u64, DocumentStoreError> {
        let key = Self::record_key(kind);
        let mut tx = self.store.begin().await?;
        let stored = match tx.get(Kind::Counter, &key).await {
            Ok(stored) => stored,
            Err(error) => return Err(Self::abort(tx, error).await),
        };
        let decoded = stored.as_ref().map(|current| decode(&current.fields));
        let record = match decoded.transpose() {
            Ok(record) => record.unwrap_or_default(),
            Err(error) => return Err(Self::abort(tx, error).await),
        };
        tx.rollback().await?;
        Ok(record.value_for(owner))
    }
}

#[cfg(test)]
#[path = "counters_tests.rs"]
mod counters_tests;
