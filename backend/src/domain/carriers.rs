//! Carrier relationship integrity.
//!
//! Assignment and detachment mutate a load's carrier field directly and
//! persist through the store port, outside the standard lifecycle path: a
//! relationship move changes neither ownership nor existence, so no
//! counter is touched.

use std::sync::Arc;

use tracing::error;

use super::entity::{Entity, EntityKey, KeySpec, Kind, StoredDocument};
use super::error::Error;
use super::lifecycle::PAGE_SIZE;
use super::load::{CarrierRef, Load};
use super::ports::{DocumentStore, DocumentStoreError, KindQuery, PropertyFilter};

/// Enforces carrier exclusivity and cascading detachment.
pub struct CarrierService {
    store: Arc<dyn DocumentStore>,
}

impl CarrierService {
    /// Build a carrier service over the given store handle.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn map_store_error(failure: DocumentStoreError) -> Error {
        error!(error = %failure, "document store failure");
        Error::internal("storage operation failed")
    }

    async fn require(&self, kind: Kind, key: &EntityKey) -> Result<StoredDocument, Error> {
        self.store
            .get(kind, key)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Error::not_found(format!("no {kind} with id {key}")))
    }

    fn decode_load(stored: &StoredDocument) -> Result<Load, Error> {
        Load::from_document(&stored.fields).map_err(|report| {
            error!(key = %stored.key, error = %report, "persisted load failed decoding");
            Error::internal("stored entity is corrupt")
        })
    }

    async fn persist_load(&self, key: &EntityKey, load: &Load) -> Result<(), Error> {
        self.store
            .put(Kind::Load, KeySpec::Existing(key.clone()), load.to_document())
            .await
            .map(|_| ())
            .map_err(Self::map_store_error)
    }

    /// Assign the load to the boat as its carrier.
    ///
    /// An already-carried load cannot be reassigned directly; it must be
    /// removed from its current carrier first.
    ///
    /// # Errors
    /// `NotFound` when either entity is absent, `Conflict` when the load
    /// already has a carrier.
    pub async fn assign(&self, boat_key: &EntityKey, load_key: &EntityKey) -> Result<(), Error> {
        let boat = self.require(Kind::Boat, boat_key).await?;
        let stored_load = self.require(Kind::Load, load_key).await?;
        let mut load = Self::decode_load(&stored_load)?;

        if load.carrier.is_some() {
            return Err(Error::conflict("load is already assigned to a carrier"));
        }
        let Some(boat_id) = boat.key.id() else {
            return Err(Error::internal("boat key has no numeric id"));
        };

        load.carrier = Some(CarrierRef::boat(boat_id));
        self.persist_load(&stored_load.key, &load).await
    }

    /// Detach the load from the boat.
    ///
    /// The pairing must exist exactly as specified: an unassigned load, or
    /// one carried by a different boat, does not match.
    ///
    /// # Errors
    /// `NotFound` when either entity is absent or the pairing does not
    /// match.
    pub async fn unassign(&self, boat_key: &EntityKey, load_key: &EntityKey) -> Result<(), Error> {
        let boat = self.require(Kind::Boat, boat_key).await?;
        let stored_load = self.require(Kind::Load, load_key).await?;
        let mut load = Self::decode_load(&stored_load)?;

        let carried_by_boat = load
            .carrier
            .is_some_and(|carrier| Some(carrier.id) == boat.key.id());
        if !carried_by_boat {
            return Err(Error::not_found("no such load is assigned to this boat"));
        }

        load.carrier = None;
        self.persist_load(&stored_load.key, &load).await
    }

    /// Null the carrier on every load that referenced a deleted boat.
    ///
    /// Runs after the boat itself is gone. Matching loads are collected
    /// first, following cursors across pages, then each is detached. Best
    /// effort: an individual persist failure is logged and the remainder
    /// still runs.
    ///
    /// # Errors
    /// Surfaces query failures hit while collecting; otherwise returns the
    /// number of loads detached.
    pub async fn detach_all(&self, boat_id: i64) -> Result<usize, Error> {
        let reference = CarrierRef::boat(boat_id).to_value();
        let mut carried = Vec::new();
        let mut cursor = None;
        loop {
            let page = self
                .store
                .query(KindQuery {
                    kind: Kind::Load,
                    filter: Some(PropertyFilter {
                        field: "carrier",
                        value: reference.clone(),
                    }),
                    page_size: PAGE_SIZE,
                    cursor: cursor.take(),
                })
                .await
                .map_err(Self::map_store_error)?;
            carried.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let mut detached = 0_usize;
        for stored_load in carried {
            // Decode failures are already logged; skip and keep going.
            let Ok(mut load) = Self::decode_load(&stored_load) else {
                continue;
            };
            load.carrier = None;
            match self.persist_load(&stored_load.key, &load).await {
                Ok(()) => detached += 1,
                Err(failure) => {
                    error!(
                        key = %stored_load.key,
                        error = %failure,
                        "cascade detach failed for load"
                    );
                }
            }
        }
        Ok(detached)
    }
}

#[cfg(test)]
#[path = "carriers_tests.rs"]
mod carriers_tests;
