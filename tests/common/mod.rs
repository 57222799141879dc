// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use goride::db::{
    CollectionPath, Document, DocumentId, DocumentPath, DocumentStore, DocumentWrite, Fields,
    FirestoreStore, OrderedQuery, SnapshotEvent, StoreError, Subscription, SubscriptionHandle,
};
use goride::services::RideListState;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_store() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A remote call seen by [`ScriptedStore`].
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Subscribe(String),
    Add {
        collection: String,
        fields: Fields,
        stamped: Vec<String>,
    },
    Delete(String),
    UpsertMerge(String, Fields),
    Get(String),
}

#[allow(dead_code)]
struct Feed {
    events: mpsc::UnboundedSender<SnapshotEvent>,
    cancelled: oneshot::Receiver<()>,
}

/// Fake store driven by the test: records every call, hands out feeds the
/// test pushes events into, and can be told to fail requests.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedStore {
    calls: Mutex<Vec<Call>>,
    feeds: Mutex<Vec<Feed>>,
    failure: Mutex<Option<StoreError>>,
    subscribe_failure: Mutex<Option<StoreError>>,
    documents: Mutex<HashMap<String, Fields>>,
    next_id: Mutex<u32>,
    stall_adds: AtomicBool,
}

#[allow(dead_code)]
impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than subscriptions and reads.
    pub fn write_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Add { .. } | Call::Delete(_) | Call::UpsertMerge(..)))
            .collect()
    }

    /// Make every add/delete/upsert/get fail with `error`.
    pub fn fail_requests(&self, error: StoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Make `add` record the call and then never complete.
    pub fn stall_adds(&self) {
        self.stall_adds.store(true, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, error: StoreError) {
        *self.subscribe_failure.lock().unwrap() = Some(error);
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.lock().unwrap().len()
    }

    /// Push an event into feed `index`, ignoring cancellation (a late
    /// delivery). Returns false if the receiving side is gone.
    pub fn push(&self, index: usize, event: SnapshotEvent) -> bool {
        self.feeds.lock().unwrap()[index].events.send(event).is_ok()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        let mut feeds = self.feeds.lock().unwrap();
        !matches!(
            feeds[index].cancelled.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        )
    }

    pub fn seed(&self, document: &DocumentPath, fields: Fields) {
        self.documents
            .lock()
            .unwrap()
            .insert(document.to_string(), fields);
    }

    fn record(&self, call: Call) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn subscribe(&self, query: OrderedQuery) -> Result<Subscription, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Subscribe(query.collection.to_string()));
        if let Some(error) = self.subscribe_failure.lock().unwrap().clone() {
            return Err(error);
        }

        let (events_tx, events) = mpsc::unbounded_channel();
        let (handle, cancelled) = SubscriptionHandle::new();
        self.feeds.lock().unwrap().push(Feed {
            events: events_tx,
            cancelled,
        });
        Ok(Subscription { events, handle })
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        write: DocumentWrite,
    ) -> Result<DocumentId, StoreError> {
        self.record(Call::Add {
            collection: collection.to_string(),
            fields: write.fields().clone(),
            stamped: write.server_timestamps().to_vec(),
        })?;
        if self.stall_adds.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        Ok(format!("ride-{}", next_id))
    }

    async fn delete(&self, document: &DocumentPath) -> Result<(), StoreError> {
        self.record(Call::Delete(document.to_string()))
    }

    async fn upsert_merge(
        &self,
        document: &DocumentPath,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        self.record(Call::UpsertMerge(
            document.to_string(),
            write.fields().clone(),
        ))?;
        let resolved = write.resolve("2024-01-15T08:00:00.000000Z");
        self.documents
            .lock()
            .unwrap()
            .entry(document.to_string())
            .or_default()
            .extend(resolved);
        Ok(())
    }

    async fn get(&self, document: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.record(Call::Get(document.to_string()))?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(&document.to_string())
            .map(|fields| Document::new(document.id(), fields.clone())))
    }
}

/// A ride document as the store would deliver it.
#[allow(dead_code)]
pub fn ride_doc(id: &str, pickup: &str, drop: &str, created_at: &str) -> Document {
    let mut fields = Fields::new();
    fields.insert("pickup".to_string(), json!(pickup));
    fields.insert("drop".to_string(), json!(drop));
    fields.insert("createdAt".to_string(), json!(created_at));
    Document::new(id, fields)
}

/// Wait (bounded) until the state satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut watch::Receiver<RideListState>, predicate: F) -> RideListState
where
    F: FnMut(&RideListState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("Timed out waiting for rides state")
        .expect("State channel closed")
        .clone()
}

/// Give spawned tasks a chance to run.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
