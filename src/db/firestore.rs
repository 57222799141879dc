// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore adapter for the document store port.
//!
//! Provides:
//! - Nested collection paths (`users/{uid}/rides`) via parent paths
//! - Merge writes using update field masks
//! - Store-stamped fields as server request time transforms
//! - Live ordered queries backed by a Firestore listener

use crate::db::store::{
    CollectionPath, Direction, Document, DocumentId, DocumentPath, DocumentStore, DocumentWrite,
    Fields, OrderedQuery, SnapshotEvent, StoreError, Subscription, SubscriptionHandle,
};
use crate::time_utils::format_store_timestamp;
use async_trait::async_trait;
use firestore::{
    FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage,
    FirestoreQueryDirection, FirestoreTransformServerValue, ParentPathBuilder,
};
use gcloud_sdk::google::firestore::v1::value::ValueType;
use tokio::sync::mpsc;

/// Listener target id; each subscription owns its own listener.
const LISTENER_TARGET_ID: u32 = 1;

/// Prefix of the metadata keys the Firestore deserializer may add.
const METADATA_PREFIX: &str = "_firestore_";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All store operations return an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("Database not connected (offline mode)".into()))
    }
}

fn store_error(e: firestore::errors::FirestoreError) -> StoreError {
    StoreError::from_message(e.to_string())
}

/// Build the Firestore parent path of a document (`.../documents/users/u1`).
fn parent_path(
    client: &firestore::FirestoreDb,
    document: &DocumentPath,
) -> Result<ParentPathBuilder, StoreError> {
    let collection = document.collection();
    match collection.parent() {
        None => client
            .parent_path(collection.name(), document.id())
            .map_err(store_error),
        Some(grandparent) => parent_path(client, grandparent)?
            .at(collection.name(), document.id())
            .map_err(store_error),
    }
}

/// Parent resource of a collection: the database root or a document path.
fn collection_parent(
    client: &firestore::FirestoreDb,
    collection: &CollectionPath,
) -> Result<String, StoreError> {
    match collection.parent() {
        None => Ok(client.get_documents_path().to_string()),
        Some(parent) => Ok(parent_path(client, parent)?.as_ref().to_string()),
    }
}

fn query_direction(direction: Direction) -> FirestoreQueryDirection {
    match direction {
        Direction::Ascending => FirestoreQueryDirection::Ascending,
        Direction::Descending => FirestoreQueryDirection::Descending,
    }
}

fn decode_document(doc: &firestore::FirestoreDocument) -> Result<Document, StoreError> {
    let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
    let mut fields: Fields = firestore::FirestoreDb::deserialize_doc_to(doc)
        .map_err(|e| StoreError::Backend(format!("Failed to decode {}: {}", doc.name, e)))?;
    fields.retain(|key, _| !key.starts_with(METADATA_PREFIX));
    normalize_timestamps(doc, &mut fields);
    Ok(Document { id, fields })
}

/// Rewrite top-level timestamp values in the store's string format.
fn normalize_timestamps(doc: &firestore::FirestoreDocument, fields: &mut Fields) {
    for (name, value) in &doc.fields {
        let Some(ValueType::TimestampValue(ts)) = &value.value_type else {
            continue;
        };
        let nanos = u32::try_from(ts.nanos).unwrap_or_default();
        if let Some(at) = chrono::DateTime::from_timestamp(ts.seconds, nanos) {
            fields.insert(
                name.clone(),
                serde_json::Value::String(format_store_timestamp(at)),
            );
        }
    }
}

/// Run an ordered query and decode the result.
async fn query_ordered(
    client: &firestore::FirestoreDb,
    query: &OrderedQuery,
) -> Result<Vec<Document>, StoreError> {
    let parent = collection_parent(client, &query.collection)?;

    let docs = client
        .fluent()
        .select()
        .from(query.collection.name())
        .parent(&parent)
        .order_by([(
            query.order_by.as_str(),
            query_direction(query.direction),
        )])
        .query()
        .await
        .map_err(store_error)?;

    docs.iter().map(decode_document).collect()
}

fn snapshot_event(result: Result<Vec<Document>, StoreError>) -> SnapshotEvent {
    match result {
        Ok(documents) => SnapshotEvent::Snapshot(documents),
        Err(e) => SnapshotEvent::Error(e.to_string()),
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn subscribe(&self, query: OrderedQuery) -> Result<Subscription, StoreError> {
        let client = self.get_client()?.clone();
        let parent = collection_parent(&client, &query.collection)?;

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(store_error)?;

        client
            .fluent()
            .select()
            .from(query.collection.name())
            .parent(&parent)
            .listen()
            .add_target(FirestoreListenerTarget::new(LISTENER_TARGET_ID), &mut listener)
            .map_err(store_error)?;

        let (events_tx, events) = mpsc::unbounded_channel();
        let (handle, cancelled) = SubscriptionHandle::new();

        // Initial snapshot, so an empty collection still produces a delivery.
        let _ = events_tx.send(snapshot_event(query_ordered(&client, &query).await));

        // The listener reports individual changes; re-run the ordered query on
        // each one so subscribers always receive a full snapshot.
        let callback_client = client.clone();
        let callback_query = query.clone();
        let callback_tx = events_tx.clone();
        listener
            .start(move |event| {
                let client = callback_client.clone();
                let query = callback_query.clone();
                let events_tx = callback_tx.clone();
                async move {
                    if !matches!(event, FirestoreListenEvent::TargetChange(_)) {
                        let _ = events_tx.send(snapshot_event(query_ordered(&client, &query).await));
                    }
                    Ok(())
                }
            })
            .await
            .map_err(store_error)?;

        let collection = query.collection.to_string();
        tracing::debug!(collection = %collection, "Firestore listener started");

        tokio::spawn(async move {
            // Resolves on explicit cancel or when the handle is dropped.
            let _ = cancelled.await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(collection = %collection, error = %e, "Listener shutdown failed");
            } else {
                tracing::debug!(collection = %collection, "Firestore listener stopped");
            }
        });

        Ok(Subscription { events, handle })
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        write: DocumentWrite,
    ) -> Result<DocumentId, StoreError> {
        let client = self.get_client()?;
        let parent = collection_parent(client, collection)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let stamped = write.server_timestamps();

        let _: () = client
            .fluent()
            .update()
            .in_col(collection.name())
            .document_id(&id)
            .parent(&parent)
            .object(write.fields())
            .transforms(|t| {
                t.fields(
                    stamped
                        .iter()
                        .map(|name| {
                            t.field(name.as_str())
                                .server_value(FirestoreTransformServerValue::RequestTime)
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .execute()
            .await
            .map_err(store_error)?;

        Ok(id)
    }

    async fn delete(&self, document: &DocumentPath) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let parent = collection_parent(client, document.collection())?;

        client
            .fluent()
            .delete()
            .from(document.collection().name())
            .document_id(document.id())
            .parent(&parent)
            .execute()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn upsert_merge(
        &self,
        document: &DocumentPath,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let parent = collection_parent(client, document.collection())?;
        let mask: Vec<String> = write.fields().keys().cloned().collect();
        let stamped = write.server_timestamps();

        // The field mask limits the update to the written fields; stamped
        // fields are set by the server through transforms.
        let _: () = client
            .fluent()
            .update()
            .fields(mask)
            .in_col(document.collection().name())
            .document_id(document.id())
            .parent(&parent)
            .object(write.fields())
            .transforms(|t| {
                t.fields(
                    stamped
                        .iter()
                        .map(|name| {
                            t.field(name.as_str())
                                .server_value(FirestoreTransformServerValue::RequestTime)
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .execute()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn get(&self, document: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let client = self.get_client()?;
        let parent = collection_parent(client, document.collection())?;

        let doc = client
            .fluent()
            .select()
            .by_id_in(document.collection().name())
            .parent(&parent)
            .one(document.id())
            .await
            .map_err(store_error)?;

        doc.as_ref().map(decode_document).transpose()
    }
}
