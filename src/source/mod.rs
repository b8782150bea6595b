//! Record source abstraction
//!
//! The hosted backend owns persistence and live queries. This module models
//! the part of its client library the app consumes: live subscriptions,
//! one-shot reads, merge-writes and deletes over named collections.

mod memory;

pub use memory::MemoryStore;

use futures::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{HiveError, Result};

/// Document fields as stored by the backend.
pub type Fields = serde_json::Map<String, Value>;

/// Named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Messages,
    Bookings,
    Services,
    Users,
    Reviews,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Messages,
        Collection::Bookings,
        Collection::Services,
        Collection::Users,
        Collection::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Messages => "messages",
            Collection::Bookings => "bookings",
            Collection::Services => "services",
            Collection::Users => "users",
            Collection::Reviews => "reviews",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side query filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// Single document by id
    Id(String),
    /// Array field contains the given string
    Contains { field: String, value: String },
    /// Field equals the given value
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Filter::Id(id.into())
    }

    pub fn matches(&self, id: &str, fields: &Fields) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(wanted) => wanted == id,
            Filter::Contains { field, value } => fields
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(value.as_str()))),
            Filter::Eq { field, value } => fields.get(field) == Some(value),
        }
    }
}

/// A stored document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into a model. The record id is exposed as the `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| HiveError::Validation(format!("malformed record {}: {}", self.id, e)))
    }
}

/// Serialize a model into document fields, dropping its `id`.
pub fn encode<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(HiveError::Validation(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(HiveError::Validation(format!("cannot encode record: {}", e))),
    }
}

/// Immutable result of one live-query evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub collection: Collection,
    pub records: Vec<Record>,
}

impl Snapshot {
    /// Decode every record, skipping (and logging) malformed ones.
    pub fn decode_all<T: DeserializeOwned>(&self) -> Vec<T> {
        decode_records(self.collection, &self.records)
    }
}

pub(crate) fn decode_records<T: DeserializeOwned>(
    collection: Collection,
    records: &[Record],
) -> Vec<T> {
    records
        .iter()
        .filter_map(|r| match r.decode() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Skipping {} record: {}", collection, e);
                None
            }
        })
        .collect()
}

/// Live query handle yielding a snapshot now and after every change.
///
/// The listener is released when the handle is dropped, on every exit
/// path of the owning task.
pub struct Subscription {
    collection: Collection,
    inner: BoxStream<'static, Snapshot>,
}

impl Subscription {
    pub fn new<S>(collection: Collection, snapshots: S) -> Self
    where
        S: Stream<Item = Snapshot> + Send + 'static,
    {
        tracing::debug!("Acquired {} subscription", collection);
        Self {
            collection,
            inner: snapshots.boxed(),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!("Released {} subscription", self.collection);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

/// Client side of the hosted document database.
///
/// `write` with an id merges the given fields into the existing document
/// (creating it if absent); without an id it creates a new document.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    fn subscribe(&self, collection: Collection, filter: Filter) -> Result<Subscription>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>>;

    async fn list(&self, collection: Collection, filter: Filter) -> Result<Vec<Record>>;

    async fn write(&self, collection: Collection, id: Option<&str>, fields: Fields)
        -> Result<String>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;
}

/// Fetch and decode a single record.
pub async fn get_as<S, T>(source: &S, collection: Collection, id: &str) -> Result<Option<T>>
where
    S: RecordSource,
    T: DeserializeOwned,
{
    match source.get(collection, id).await? {
        Some(record) => record.decode().map(Some),
        None => Ok(None),
    }
}

/// Run a one-shot query and decode the results, skipping malformed records.
pub async fn list_as<S, T>(source: &S, collection: Collection, filter: Filter) -> Result<Vec<T>>
where
    S: RecordSource,
    T: DeserializeOwned,
{
    let records = source.list(collection, filter).await?;
    Ok(decode_records(collection, &records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_filter_matching() {
        let doc = fields(json!({"participants": ["a", "b"], "status": "Pending"}));
        assert!(Filter::All.matches("d1", &doc));
        assert!(Filter::id("d1").matches("d1", &doc));
        assert!(!Filter::id("d2").matches("d1", &doc));
        assert!(Filter::contains("participants", "a").matches("d1", &doc));
        assert!(!Filter::contains("participants", "c").matches("d1", &doc));
        assert!(!Filter::contains("status", "Pending").matches("d1", &doc));
        assert!(Filter::equals("status", "Pending").matches("d1", &doc));
        assert!(!Filter::equals("missing", "x").matches("d1", &doc));
    }

    #[test]
    fn test_decode_uses_record_id_and_defaults() {
        let record = Record::new("u1", fields(json!({"name": "Ann", "id": "stale"})));
        let user: User = record.decode().unwrap();
        assert_eq!(user.id, "u1");
        assert!(!user.is_service_provider);

        let bad = Record::new("u2", fields(json!({"isAdmin": "yes"})));
        assert!(matches!(
            bad.decode::<User>(),
            Err(HiveError::Validation(_))
        ));
    }

    #[test]
    fn test_encode_drops_id() {
        let user = User {
            id: "u1".into(),
            name: "Ann".into(),
            ..Default::default()
        };
        let f = encode(&user).unwrap();
        assert!(!f.contains_key("id"));
        assert_eq!(f.get("name"), Some(&json!("Ann")));
        assert!(encode(&5).is_err());
    }

    #[test]
    fn test_collection_names_round_trip() {
        for c in Collection::ALL {
            assert_eq!(Collection::parse(c.as_str()), Some(c));
        }
        assert_eq!(Collection::parse("orders"), None);
    }
}
