// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store port.
//!
//! The app only needs a handful of operations from its backing database:
//! add/delete/merge-update of small documents, single document reads, and a
//! live query over one collection ordered by a field. Adapters live next to
//! this module ([`MemoryStore`](super::MemoryStore) and
//! [`FirestoreStore`](super::FirestoreStore)).

use async_trait::async_trait;
use std::fmt;
use tokio::sync::{mpsc, oneshot};

/// Field map of a single document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Store-assigned document identifier.
pub type DocumentId = String;

/// Path of a collection, optionally nested under a parent document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    parent: Option<Box<DocumentPath>>,
    name: String,
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            parent: None,
            name: name.into(),
        }
    }

    /// Path of a document inside this collection.
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent document, `None` for top-level collections.
    pub fn parent(&self) -> Option<&DocumentPath> {
        self.parent.as_deref()
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{}/{}", parent, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// A collection nested under this document.
    pub fn sub_collection(&self, name: impl Into<String>) -> CollectionPath {
        CollectionPath {
            parent: Some(Box::new(self.clone())),
            name: name.into(),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// String value of a field, `None` if missing or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }
}

/// Fields to write, plus the fields the store fills with its commit time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    fields: Fields,
    server_timestamps: Vec<String>,
}

impl DocumentWrite {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Ask the store to set `field` to its own timestamp when committing.
    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn server_timestamps(&self) -> &[String] {
        &self.server_timestamps
    }

    /// Final field map with server timestamps filled in.
    pub fn resolve(self, timestamp: &str) -> Fields {
        let mut fields = self.fields;
        for name in self.server_timestamps {
            fields.insert(name, serde_json::Value::String(timestamp.to_string()));
        }
        fields
    }
}

/// Sort direction of an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Live query over a single collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedQuery {
    pub collection: CollectionPath,
    pub order_by: String,
    pub direction: Direction,
}

/// One delivery on a live subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// Full, ordered contents of the collection.
    Snapshot(Vec<Document>),
    /// The subscription failed; the transport may recover later.
    Error(String),
}

/// An open live query: a stream of events plus the handle that cancels it.
#[derive(Debug)]
pub struct Subscription {
    pub events: mpsc::UnboundedReceiver<SnapshotEvent>,
    pub handle: SubscriptionHandle,
}

/// Cancels a live query when cancelled explicitly or dropped.
#[derive(Debug)]
pub struct SubscriptionHandle {
    cancel: Option<oneshot::Sender<()>>,
}

impl SubscriptionHandle {
    /// Create a handle and the receiver the adapter watches for cancellation.
    ///
    /// The receiver resolves when the handle is cancelled or dropped.
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { cancel: Some(tx) }, rx)
    }

    /// Cancel the subscription. Calling this more than once is a no-op.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Errors surfaced by document store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Document store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Classify an adapter error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("PERMISSION_DENIED") || message.contains("PermissionDenied") {
            Self::PermissionDenied(message)
        } else if message.contains("UNAVAILABLE") || message.contains("Unavailable") {
            Self::Unavailable(message)
        } else {
            Self::Backend(message)
        }
    }
}

/// Operations the app needs from its document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live query. The first event is the current snapshot.
    async fn subscribe(&self, query: OrderedQuery) -> Result<Subscription, StoreError>;

    /// Add a document with a store-assigned id.
    async fn add(
        &self,
        collection: &CollectionPath,
        write: DocumentWrite,
    ) -> Result<DocumentId, StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, document: &DocumentPath) -> Result<(), StoreError>;

    /// Create the document or merge `write` into it, leaving other fields alone.
    async fn upsert_merge(
        &self,
        document: &DocumentPath,
        write: DocumentWrite,
    ) -> Result<(), StoreError>;

    /// Read a single document.
    async fn get(&self, document: &DocumentPath) -> Result<Option<Document>, StoreError>;
}
