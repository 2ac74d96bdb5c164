//! In-memory document store adapter.
//!
//! Default adapter for local serving and tests. Tables are `BTreeMap`s per
//! kind, so iteration follows the store's natural key order, which is also
//! allocation order for numeric ids. A transaction owns the store mutex for
//! its whole lifetime: staged writes apply on commit and vanish on
//! rollback, giving counter adjustments the serialised read-modify-write
//! they rely on.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Cursor, Page};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entity::{Document, EntityKey, KeySpec, Kind, StoredDocument};
use crate::domain::ports::{DocumentStore, DocumentStoreError, KindQuery, StoreTransaction};

/// Cursor payload issued by this adapter: the last key of the previous
/// page.
#[derive(Debug, Serialize, Deserialize)]
struct ResumePoint {
    kind: Kind,
    last: EntityKey,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<Kind, BTreeMap<EntityKey, Document>>,
    sequences: HashMap<Kind, i64>,
}

impl MemoryState {
    fn allocate_id(&mut self, kind: Kind) -> i64 {
        let sequence = self.sequences.entry(kind).or_insert(0);
        *sequence += 1;
        *sequence
    }

    fn insert(&mut self, kind: Kind, key: EntityKey, fields: Document) {
        self.tables.entry(kind).or_default().insert(key, fields);
    }

    fn get(&self, kind: Kind, key: &EntityKey) -> Option<StoredDocument> {
        self.tables
            .get(&kind)
            .and_then(|table| table.get(key))
            .map(|fields| StoredDocument {
                key: key.clone(),
                fields: fields.clone(),
            })
    }

    fn remove(&mut self, kind: Kind, key: &EntityKey) {
        if let Some(table) = self.tables.get_mut(&kind) {
            table.remove(key);
        }
    }

    fn run_query(&self, query: &KindQuery) -> Result<Page<StoredDocument>, DocumentStoreError> {
        let resume = decode_resume(query)?;
        let mut entities: Vec<StoredDocument> = Vec::new();
        let mut next_cursor = None;

        let Some(table) = self.tables.get(&query.kind) else {
            return Ok(Page::new(entities, next_cursor));
        };

        let range = match &resume {
            Some(last) => table.range((Bound::Excluded(last.clone()), Bound::Unbounded)),
            None => table.range::<EntityKey, (Bound<EntityKey>, Bound<EntityKey>)>((
                Bound::Unbounded,
                Bound::Unbounded,
            )),
        };

        for (key, fields) in range {
            if let Some(filter) = &query.filter {
                if fields.get(filter.field) != Some(&filter.value) {
                    continue;
                }
            }
            if entities.len() == query.page_size {
                // A further match exists, so this page gets a cursor.
                if let Some(final_entity) = entities.last() {
                    next_cursor = Some(encode_resume(query.kind, final_entity.key.clone())?);
                }
                break;
            }
            entities.push(StoredDocument {
                key: key.clone(),
                fields: fields.clone(),
            });
        }

        Ok(Page::new(entities, next_cursor))
    }
}

fn decode_resume(query: &KindQuery) -> Result<Option<EntityKey>, DocumentStoreError> {
    let Some(cursor) = &query.cursor else {
        return Ok(None);
    };
    let payload: ResumePoint = cursor
        .decode()
        .map_err(|err| DocumentStoreError::cursor(err.to_string()))?;
    if payload.kind != query.kind {
        return Err(DocumentStoreError::cursor(format!(
            "cursor was issued for kind {}, not {}",
            payload.kind.as_str(),
            query.kind.as_str()
        )));
    }
    Ok(Some(payload.last))
}

fn encode_resume(kind: Kind, last: EntityKey) -> Result<Cursor, DocumentStoreError> {
    Cursor::encode(&ResumePoint { kind, last })
        .map_err(|err| DocumentStoreError::serialization(err.to_string()))
}

/// In-memory [`DocumentStore`] with real transaction serialisation.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(
        &self,
        kind: Kind,
        spec: KeySpec,
        fields: Document,
    ) -> Result<EntityKey, DocumentStoreError> {
        let mut state = self.inner.lock().await;
        let key = match spec {
            KeySpec::Auto => EntityKey::Id(state.allocate_id(kind)),
            KeySpec::Existing(key) => key,
        };
        state.insert(kind, key.clone(), fields);
        Ok(key)
    }

    async fn get(
        &self,
        kind: Kind,
        key: &EntityKey,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        Ok(self.inner.lock().await.get(kind, key))
    }

    async fn delete(&self, kind: Kind, key: &EntityKey) -> Result<(), DocumentStoreError> {
        self.inner.lock().await.remove(kind, key);
        Ok(())
    }

    async fn query(&self, query: KindQuery) -> Result<Page<StoredDocument>, DocumentStoreError> {
        self.inner.lock().await.run_query(&query)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, DocumentStoreError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            staged: Vec::new(),
        }))
    }
}

/// Transaction holding the state lock until commit or rollback.
struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Vec<(Kind, EntityKey, Document)>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get(
        &mut self,
        kind: Kind,
        key: &EntityKey,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        // Read-your-writes: the latest staged version wins.
        let staged = self
            .staged
            .iter()
            .rev()
            .find(|(staged_kind, staged_key, _)| *staged_kind == kind && staged_key == key);
        if let Some((_, staged_key, fields)) = staged {
            return Ok(Some(StoredDocument {
                key: staged_key.clone(),
                fields: fields.clone(),
            }));
        }
        Ok(self.guard.get(kind, key))
    }

    async fn save(
        &mut self,
        kind: Kind,
        key: EntityKey,
        fields: Document,
    ) -> Result<(), DocumentStoreError> {
        self.staged.push((kind, key, fields));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DocumentStoreError> {
        let mut tx = self;
        let staged = std::mem::take(&mut tx.staged);
        for (kind, key, fields) in staged {
            tx.guard.insert(kind, key, fields);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DocumentStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::ports::PropertyFilter;

    fn fields(label: &str) -> Document {
        let mut document = Document::new();
        document.insert("item".to_owned(), json!(label));
        document
    }

    async fn seed(store: &MemoryDocumentStore, count: usize) -> Vec<EntityKey> {
        let mut keys = Vec::with_capacity(count);
        for index in 0..count {
            let key = store
                .put(Kind::Load, KeySpec::Auto, fields(&format!("item-{index}")))
                .await
                .expect("put succeeds");
            keys.push(key);
        }
        keys
    }

    #[rstest]
    #[tokio::test]
    async fn auto_keys_allocate_in_sequence() {
        let store = MemoryDocumentStore::new();
        let keys = seed(&store, 3).await;
        assert_eq!(
            keys,
            vec![EntityKey::Id(1), EntityKey::Id(2), EntityKey::Id(3)]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn named_puts_overwrite_in_place() {
        let store = MemoryDocumentStore::new();
        let key = EntityKey::Name("auth0|alice".to_owned());

        for label in ["first", "second"] {
            let written = store
                .put(
                    Kind::User,
                    KeySpec::Existing(key.clone()),
                    fields(label),
                )
                .await
                .expect("put succeeds");
            assert_eq!(written, key);
        }

        let stored = store
            .get(Kind::User, &key)
            .await
            .expect("get succeeds")
            .expect("present");
        assert_eq!(stored.fields.get("item"), Some(&json!("second")));
    }

    #[rstest]
    #[tokio::test]
    async fn get_attaches_the_resolved_key() {
        let store = MemoryDocumentStore::new();
        let keys = seed(&store, 1).await;
        let key = keys.first().expect("one key").clone();

        let stored = store
            .get(Kind::Load, &key)
            .await
            .expect("get succeeds")
            .expect("present");
        assert_eq!(stored.key, key);
        assert!(!stored.fields.contains_key("id"));
    }

    #[rstest]
    #[tokio::test]
    async fn pagination_walks_every_entity_exactly_once() {
        let store = MemoryDocumentStore::new();
        let keys = seed(&store, 7).await;

        let mut seen = Vec::new();
        let mut cursor = None;
        let mut pages = 0_usize;
        loop {
            let page = store
                .query(KindQuery {
                    kind: Kind::Load,
                    filter: None,
                    page_size: 3,
                    cursor: cursor.take(),
                })
                .await
                .expect("query succeeds");
            pages += 1;
            seen.extend(page.items.into_iter().map(|stored| stored.key));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen, keys);
    }

    #[rstest]
    #[tokio::test]
    async fn final_page_never_carries_a_cursor() {
        let store = MemoryDocumentStore::new();
        seed(&store, 3).await;

        let page = store
            .query(KindQuery {
                kind: Kind::Load,
                filter: None,
                page_size: 3,
                cursor: None,
            })
            .await
            .expect("query succeeds");

        assert_eq!(page.items.len(), 3);
        assert!(page.next_cursor.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn equality_filter_restricts_matches() {
        let store = MemoryDocumentStore::new();
        seed(&store, 2).await;

        let page = store
            .query(KindQuery {
                kind: Kind::Load,
                filter: Some(PropertyFilter {
                    field: "item",
                    value: json!("item-1"),
                }),
                page_size: 5,
                cursor: None,
            })
            .await
            .expect("query succeeds");

        assert_eq!(page.items.len(), 1);
        assert!(page.next_cursor.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn cursors_from_another_kind_are_rejected() {
        let store = MemoryDocumentStore::new();
        seed(&store, 4).await;

        let page = store
            .query(KindQuery {
                kind: Kind::Load,
                filter: None,
                page_size: 3,
                cursor: None,
            })
            .await
            .expect("query succeeds");
        let cursor = page.next_cursor.expect("more entities remain");

        let err = store
            .query(KindQuery {
                kind: Kind::Boat,
                filter: None,
                page_size: 3,
                cursor: Some(cursor),
            })
            .await
            .expect_err("kind mismatch");
        assert!(matches!(err, DocumentStoreError::Cursor { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn committed_transactions_apply_staged_writes() {
        let store = MemoryDocumentStore::new();
        let key = EntityKey::Name("Boat".to_owned());

        let mut tx = store.begin().await.expect("begin");
        tx.save(Kind::Counter, key.clone(), fields("one"))
            .await
            .expect("save stages");
        let inside = tx
            .get(Kind::Counter, &key)
            .await
            .expect("get inside tx")
            .expect("staged write visible");
        assert_eq!(inside.fields.get("item"), Some(&json!("one")));
        tx.commit().await.expect("commit");

        let stored = store
            .get(Kind::Counter, &key)
            .await
            .expect("get succeeds")
            .expect("committed");
        assert_eq!(stored.fields.get("item"), Some(&json!("one")));
    }

    #[rstest]
    #[tokio::test]
    async fn rolled_back_transactions_leave_no_trace() {
        let store = MemoryDocumentStore::new();
        let key = EntityKey::Name("Boat".to_owned());

        let mut tx = store.begin().await.expect("begin");
        tx.save(Kind::Counter, key.clone(), fields("one"))
            .await
            .expect("save stages");
        tx.rollback().await.expect("rollback");

        let stored = store.get(Kind::Counter, &key).await.expect("get succeeds");
        assert!(stored.is_none());
    }
}
