//! In-process record source with live queries
//!
//! Each collection lives behind a `tokio::sync::watch` channel holding an
//! immutable table. Subscribers get a `WatchStream` over it, so a new
//! subscription yields its matching records at once and again after every
//! write that changes them. Dropping the subscription drops the receiver,
//! which is what `listener_count` observes.

use anyhow::{Context, Result as AnyResult};
use futures::future;
use futures::StreamExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::{encode, Collection, Fields, Filter, Record, RecordSource, Snapshot, Subscription};
use crate::error::{HiveError, Result};

type Table = BTreeMap<String, Fields>;

/// On-disk layout: collection name -> record id -> fields.
type SnapshotFile = BTreeMap<String, Table>;

struct Inner {
    tables: HashMap<Collection, watch::Sender<Arc<Table>>>,
    /// When set, writes and deletes fail with a transient error.
    offline: AtomicBool,
}

/// Shared, cloneable in-memory store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = Collection::ALL
            .into_iter()
            .map(|c| {
                let (tx, _rx) = watch::channel(Arc::new(Table::new()));
                (c, tx)
            })
            .collect();
        Self {
            inner: Arc::new(Inner {
                tables,
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Load a store from a JSON snapshot file. A missing file yields an
    /// empty store.
    pub fn open(path: &Path) -> AnyResult<Self> {
        let store = Self::new();
        if !path.exists() {
            tracing::debug!("No data file at {}, starting empty", path.display());
            return Ok(store);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;
        let file: SnapshotFile =
            serde_json::from_str(&content).context("Failed to parse data file")?;

        for (name, table) in file {
            let Some(collection) = Collection::parse(&name) else {
                tracing::warn!("Ignoring unknown collection '{}' in data file", name);
                continue;
            };
            tracing::debug!("Loaded {} {} records", table.len(), collection);
            store.sender(collection).send_replace(Arc::new(table));
        }
        Ok(store)
    }

    /// Write every collection to a JSON snapshot file.
    pub fn save(&self, path: &Path) -> AnyResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }

        let file: SnapshotFile = Collection::ALL
            .into_iter()
            .map(|c| (c.as_str().to_string(), (**self.sender(c).borrow()).clone()))
            .collect();
        let content = serde_json::to_string_pretty(&file).context("Failed to serialize data")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write data file {}", path.display()))?;
        Ok(())
    }

    /// Insert or replace a record synchronously. Used for seeding.
    pub fn insert<T: Serialize>(&self, collection: Collection, id: &str, value: &T) -> Result<()> {
        let fields = encode(value)?;
        self.sender(collection).send_modify(|table| {
            Arc::make_mut(table).insert(id.to_string(), fields);
        });
        Ok(())
    }

    /// Number of live subscriptions on a collection.
    pub fn listener_count(&self, collection: Collection) -> usize {
        self.sender(collection).receiver_count()
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.sender(collection).borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        Collection::ALL.into_iter().all(|c| self.len(c) == 0)
    }

    /// Simulate losing the connection: writes fail until set back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn sender(&self, collection: Collection) -> &watch::Sender<Arc<Table>> {
        // Every collection gets a channel in `new`.
        &self.inner.tables[&collection]
    }

    fn check_online(&self, op: &str, collection: Collection) -> Result<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            tracing::warn!("{} on {} failed: store offline", op, collection);
            return Err(HiveError::Transient(format!("{} {}: offline", op, collection)));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn select(collection: Collection, table: &Table, filter: &Filter) -> Snapshot {
    let records = table
        .iter()
        .filter(|(id, fields)| filter.matches(id, fields))
        .map(|(id, fields)| Record::new(id.clone(), fields.clone()))
        .collect();
    Snapshot {
        collection,
        records,
    }
}

impl RecordSource for MemoryStore {
    fn subscribe(&self, collection: Collection, filter: Filter) -> Result<Subscription> {
        let rx = self.sender(collection).subscribe();
        let mut delivered: Option<Vec<Record>> = None;
        let snapshots = WatchStream::new(rx).filter_map(move |table| {
            let snap = select(collection, &table, &filter);
            let changed = delivered.as_ref() != Some(&snap.records);
            if changed {
                delivered = Some(snap.records.clone());
            }
            future::ready(changed.then_some(snap))
        });
        Ok(Subscription::new(collection, snapshots))
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let table = self.sender(collection).borrow();
        Ok(table
            .get(id)
            .map(|fields| Record::new(id.to_string(), fields.clone())))
    }

    async fn list(&self, collection: Collection, filter: Filter) -> Result<Vec<Record>> {
        let table = Arc::clone(&self.sender(collection).borrow());
        Ok(select(collection, &table, &filter).records)
    }

    async fn write(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Fields,
    ) -> Result<String> {
        self.check_online("write", collection)?;

        let id = id
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.sender(collection).send_modify(|table| {
            let doc = Arc::make_mut(table).entry(id.clone()).or_default();
            for (key, value) in fields {
                doc.insert(key, value);
            }
        });
        tracing::debug!("Wrote {}/{}", collection, id);
        Ok(id)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.check_online("delete", collection)?;

        self.sender(collection).send_if_modified(|table| {
            if table.contains_key(id) {
                Arc::make_mut(table).remove(id);
                true
            } else {
                false
            }
        });
        tracing::debug!("Deleted {}/{}", collection, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{get_as, list_as};
    use crate::models::User;
    use serde_json::json;
    use std::time::Duration;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_write_merges_and_get_reads_back() {
        let store = MemoryStore::new();
        let id = store
            .write(Collection::Users, None, fields(json!({"name": "Ann"})))
            .await
            .unwrap();
        store
            .write(Collection::Users, Some(&id), fields(json!({"isAdmin": true})))
            .await
            .unwrap();

        let user: User = get_as(&store, Collection::Users, &id).await.unwrap().unwrap();
        assert_eq!(user.name, "Ann");
        assert!(user.is_admin);
        assert!(get_as::<_, User>(&store, Collection::Users, "nope")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_subscription_yields_current_then_changes() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Messages, "m0", &json!({"participants": ["a", "b"]}))
            .unwrap();

        let mut sub = store
            .subscribe(Collection::Messages, Filter::contains("participants", "a"))
            .unwrap();
        let first = sub.next().await.unwrap();
        assert_eq!(first.records.len(), 1);

        store
            .write(
                Collection::Messages,
                None,
                fields(json!({"participants": ["c", "a"]})),
            )
            .await
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), sub.next())
            .await
            .expect("snapshot after write")
            .unwrap();
        assert_eq!(second.records.len(), 2);
    }

    #[tokio::test]
    async fn test_filtered_out_records_not_delivered() {
        let store = MemoryStore::new();
        let mut sub = store
            .subscribe(Collection::Messages, Filter::contains("participants", "a"))
            .unwrap();
        assert!(sub.next().await.unwrap().records.is_empty());

        let mut next = tokio_test::task::spawn(sub.next());
        store
            .insert(Collection::Messages, "m1", &json!({"participants": ["x", "y"]}))
            .unwrap();
        tokio_test::assert_pending!(next.poll());

        store
            .insert(Collection::Messages, "m2", &json!({"participants": ["a", "b"]}))
            .unwrap();
        assert!(next.is_woken());
        let snap = tokio_test::assert_ready!(next.poll()).unwrap();
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.records[0].id, "m2");
    }

    #[tokio::test]
    async fn test_drop_releases_listener() {
        let store = MemoryStore::new();
        assert_eq!(store.listener_count(Collection::Bookings), 0);

        let sub = store.subscribe(Collection::Bookings, Filter::All).unwrap();
        let other = store.subscribe(Collection::Bookings, Filter::All).unwrap();
        assert_eq!(store.listener_count(Collection::Bookings), 2);

        drop(sub);
        assert_eq!(store.listener_count(Collection::Bookings), 1);

        // Released when the owning task is cancelled, too.
        let task = tokio::spawn(async move {
            let mut other = other;
            loop {
                if other.next().await.is_none() {
                    break;
                }
            }
        });
        tokio::task::yield_now().await;
        task.abort();
        let _ = task.await;
        assert_eq!(store.listener_count(Collection::Bookings), 0);
    }

    #[tokio::test]
    async fn test_offline_write_is_transient_and_leaves_data() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, "u1", &json!({"name": "Ann"}))
            .unwrap();
        store.set_offline(true);

        let err = store
            .write(Collection::Users, Some("u1"), fields(json!({"name": "Bob"})))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        tokio_test::assert_err!(store.delete(Collection::Users, "u1").await);

        store.set_offline(false);
        let user: User = get_as(&store, Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(user.name, "Ann");
    }

    #[tokio::test]
    async fn test_save_and_open_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "helperhive-store-{}.json",
            uuid::Uuid::new_v4()
        ));
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, "u1", &json!({"name": "Ann", "isAdmin": true}))
            .unwrap();
        store.save(&path).unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        let users: Vec<User> = list_as(&reopened, Collection::Users, Filter::All)
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin);

        let _ = fs::remove_file(&path);
        assert!(MemoryStore::open(&path).unwrap().is_empty());
    }
}
