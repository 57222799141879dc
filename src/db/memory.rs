// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Behaves like Firestore for the subset the app uses: ordered live queries
//! that skip documents without the order field, merge writes, and no-op
//! deletes of missing documents. Used for offline runs and in tests.

use crate::db::store::{
    CollectionPath, Direction, Document, DocumentId, DocumentPath, DocumentStore, DocumentWrite,
    Fields, OrderedQuery, SnapshotEvent, StoreError, Subscription, SubscriptionHandle,
};
use crate::time_utils::format_store_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

/// Document store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Documents keyed by collection path, then document id.
    collections: HashMap<String, BTreeMap<DocumentId, Fields>>,
    subscribers: Vec<Subscriber>,
    last_timestamp: Option<DateTime<Utc>>,
}

struct Subscriber {
    query: OrderedQuery,
    key: String,
    events: mpsc::UnboundedSender<SnapshotEvent>,
    cancelled: oneshot::Receiver<()>,
}

impl Subscriber {
    fn is_live(&mut self) -> bool {
        // Empty means the handle is neither cancelled nor dropped.
        matches!(
            self.cancelled.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ) && !self.events.is_closed()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live subscriptions (cancelled ones are pruned first).
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain_mut(Subscriber::is_live);
        inner.subscribers.len()
    }

    /// Number of documents currently stored in `collection`.
    pub fn document_count(&self, collection: &CollectionPath) -> usize {
        self.lock()
            .collections
            .get(&collection.to_string())
            .map_or(0, BTreeMap::len)
    }
}

impl Inner {
    /// Strictly increasing commit timestamp.
    fn next_timestamp(&mut self) -> String {
        let now = Utc::now();
        let stamp = match self.last_timestamp {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        format_store_timestamp(stamp)
    }

    fn snapshot(&self, query: &OrderedQuery) -> Vec<Document> {
        let Some(documents) = self.collections.get(&query.collection.to_string()) else {
            return Vec::new();
        };

        let mut matching: Vec<(&Value, &DocumentId, &Fields)> = documents
            .iter()
            .filter_map(|(id, fields)| fields.get(&query.order_by).map(|value| (value, id, fields)))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare_values(a.0, b.0).then_with(|| a.1.cmp(b.1));
            match query.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });

        matching
            .into_iter()
            .map(|(_, id, fields)| Document::new(id.clone(), fields.clone()))
            .collect()
    }

    /// Push a fresh snapshot to every live subscriber of `key`.
    fn notify(&mut self, key: &str) {
        let mut subscribers = std::mem::take(&mut self.subscribers);
        subscribers.retain_mut(Subscriber::is_live);

        for subscriber in subscribers.iter().filter(|s| s.key == key) {
            let snapshot = self.snapshot(&subscriber.query);
            tracing::trace!(
                collection = key,
                count = snapshot.len(),
                "Delivering snapshot"
            );
            let _ = subscriber.events.send(SnapshotEvent::Snapshot(snapshot));
        }

        self.subscribers = subscribers;
    }
}

/// Firestore's cross-type ordering: null < bool < number < string < array < map.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self, query: OrderedQuery) -> Result<Subscription, StoreError> {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (handle, cancelled) = SubscriptionHandle::new();
        let key = query.collection.to_string();

        let mut inner = self.lock();
        let _ = events_tx.send(SnapshotEvent::Snapshot(inner.snapshot(&query)));
        inner.subscribers.push(Subscriber {
            query,
            key: key.clone(),
            events: events_tx,
            cancelled,
        });

        tracing::debug!(collection = %key, "Subscription opened");
        Ok(Subscription { events, handle })
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        write: DocumentWrite,
    ) -> Result<DocumentId, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let key = collection.to_string();

        let mut inner = self.lock();
        let timestamp = inner.next_timestamp();
        inner
            .collections
            .entry(key.clone())
            .or_default()
            .insert(id.clone(), write.resolve(&timestamp));
        inner.notify(&key);

        tracing::debug!(collection = %key, id = %id, "Document added");
        Ok(id)
    }

    async fn delete(&self, document: &DocumentPath) -> Result<(), StoreError> {
        let key = document.collection().to_string();

        let mut inner = self.lock();
        let removed = inner
            .collections
            .get_mut(&key)
            .and_then(|documents| documents.remove(document.id()))
            .is_some();
        if removed {
            inner.notify(&key);
        }

        tracing::debug!(document = %document, removed, "Document deleted");
        Ok(())
    }

    async fn upsert_merge(
        &self,
        document: &DocumentPath,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let key = document.collection().to_string();

        let mut inner = self.lock();
        let timestamp = inner.next_timestamp();
        let merged = inner
            .collections
            .entry(key.clone())
            .or_default()
            .entry(document.id().to_string())
            .or_default();
        merged.extend(write.resolve(&timestamp));
        inner.notify(&key);

        tracing::debug!(document = %document, "Document merged");
        Ok(())
    }

    async fn get(&self, document: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .collections
            .get(&document.collection().to_string())
            .and_then(|documents| documents.get(document.id()))
            .map(|fields| Document::new(document.id(), fields.clone())))
    }
}
