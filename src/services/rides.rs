// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride list synchronization.
//!
//! Keeps a local, observable copy of `users/{uid}/rides` in step with the
//! store through a live subscription ordered by `createdAt` descending.
//! Creates and deletes go to the store only; the local list changes solely
//! when a snapshot arrives, and each snapshot replaces it wholesale.

use crate::db::{
    fields, rides_collection, CollectionPath, Direction, DocumentId, DocumentStore, OrderedQuery,
    SnapshotEvent, SubscriptionHandle,
};
use crate::error::{AppError, Result};
use crate::models::{NewRide, RideRecord};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Observable state of the rides list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RideListState {
    /// Latest snapshot, most recent first
    pub rides: Vec<RideRecord>,
    /// True from `start` until the first delivery
    pub is_loading: bool,
    /// Last subscription error, cleared by the next snapshot
    pub error: Option<String>,
    /// Create requests still in flight
    pub pending_writes: usize,
}

impl RideListState {
    /// The sticky subscription error as an [`AppError`].
    pub fn subscription_error(&self) -> Option<AppError> {
        self.error.clone().map(AppError::Subscription)
    }
}

/// Mirrors one user's rides collection and submits changes to it.
pub struct RideListSynchronizer {
    store: Arc<dyn DocumentStore>,
    shared: Arc<Shared>,
}

struct Shared {
    state: watch::Sender<RideListState>,
    active: Mutex<Active>,
}

/// Current subscription. `generation` changes on every start/stop so that
/// events from an older subscription can be recognised and dropped.
#[derive(Default)]
struct Active {
    generation: u64,
    uid: Option<String>,
    handle: Option<SubscriptionHandle>,
    pump: Option<JoinHandle<()>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Active> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an event if it belongs to the current subscription.
    ///
    /// Returns false when the event was stale and ignored.
    fn apply(&self, generation: u64, event: SnapshotEvent) -> bool {
        let active = self.lock();
        if active.generation != generation {
            tracing::debug!(generation, current = active.generation, "Ignoring stale event");
            return false;
        }

        match event {
            SnapshotEvent::Snapshot(documents) => {
                let rides: Vec<RideRecord> =
                    documents.iter().map(RideRecord::from_document).collect();
                tracing::debug!(uid = ?active.uid, count = rides.len(), "Rides snapshot applied");
                self.state.send_modify(|state| {
                    state.rides = rides;
                    state.is_loading = false;
                    state.error = None;
                });
            }
            SnapshotEvent::Error(reason) => {
                tracing::warn!(uid = ?active.uid, error = %reason, "Rides subscription error");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(reason);
                });
            }
        }
        true
    }

    fn adjust_pending(&self, generation: u64, delta: isize) {
        let active = self.lock();
        if active.generation == generation {
            self.state.send_modify(|state| {
                state.pending_writes = state.pending_writes.saturating_add_signed(delta);
            });
        }
    }
}

/// Counts one in-flight create; the count drops again even if the request
/// future is abandoned.
struct PendingWrite {
    shared: Arc<Shared>,
    generation: u64,
}

impl PendingWrite {
    fn begin(shared: Arc<Shared>, generation: u64) -> Self {
        shared.adjust_pending(generation, 1);
        Self { shared, generation }
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        self.shared.adjust_pending(self.generation, -1);
    }
}

async fn pump(
    shared: Arc<Shared>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<SnapshotEvent>,
) {
    while let Some(event) = events.recv().await {
        if !shared.apply(generation, event) {
            break;
        }
    }
    tracing::trace!(generation, "Rides event pump finished");
}

impl RideListSynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(RideListState::default());
        Self {
            store,
            shared: Arc::new(Shared {
                state,
                active: Mutex::new(Active::default()),
            }),
        }
    }

    /// Read-only view of the state; changes on every applied event.
    pub fn watch(&self) -> watch::Receiver<RideListState> {
        self.shared.state.subscribe()
    }

    /// Copy of the current state.
    pub fn state(&self) -> RideListState {
        self.shared.state.borrow().clone()
    }

    /// Uid of the active subscription.
    pub fn uid(&self) -> Option<String> {
        self.shared.lock().uid.clone()
    }

    /// Subscribe to `uid`'s rides, replacing any subscription for another user.
    pub async fn start(&self, uid: &str) -> Result<()> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(AppError::validation("A signed-in user is required"));
        }

        let generation = {
            let mut active = self.shared.lock();
            if active.uid.as_deref() == Some(uid)
                && active.handle.as_ref().is_some_and(SubscriptionHandle::is_active)
            {
                tracing::debug!(uid, "Rides subscription already active");
                return Ok(());
            }
            release(&mut active);
            active.generation += 1;
            active.uid = Some(uid.to_string());
            self.shared.state.send_replace(RideListState {
                is_loading: true,
                ..RideListState::default()
            });
            active.generation
        };

        let query = OrderedQuery {
            collection: rides_collection(uid),
            order_by: fields::CREATED_AT.to_string(),
            direction: Direction::Descending,
        };

        let subscription = match self.store.subscribe(query).await {
            Ok(subscription) => subscription,
            Err(e) => {
                let active = self.shared.lock();
                if active.generation == generation {
                    self.shared.state.send_modify(|state| {
                        state.is_loading = false;
                        state.error = Some(e.to_string());
                    });
                }
                tracing::warn!(uid, error = %e, "Failed to subscribe to rides");
                return Err(e.into());
            }
        };

        let mut active = self.shared.lock();
        if active.generation != generation {
            // Stopped or restarted while subscribing; dropping cancels it.
            tracing::debug!(uid, "Discarding superseded rides subscription");
            return Ok(());
        }
        active.handle = Some(subscription.handle);
        active.pump = Some(tokio::spawn(pump(
            self.shared.clone(),
            generation,
            subscription.events,
        )));

        tracing::info!(uid, "Rides subscription started");
        Ok(())
    }

    /// Release the subscription. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut active = self.shared.lock();
        active.generation += 1;
        if let Some(uid) = active.uid.take() {
            tracing::info!(uid = %uid, "Rides subscription stopped");
        }
        release(&mut active);
    }

    /// Validate and submit a new ride.
    ///
    /// The list is not touched; the ride shows up with the next snapshot.
    pub async fn create(&self, pickup: &str, drop: &str) -> Result<DocumentId> {
        let ride = NewRide::new(pickup, drop)?;
        let (collection, generation) = self.active_collection()?;

        let pending = PendingWrite::begin(self.shared.clone(), generation);
        let result = self.store.add(&collection, ride.into_write()).await;
        std::mem::drop(pending);

        match result {
            Ok(id) => {
                tracing::info!(collection = %collection, id = %id, "Ride booked");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "Ride booking failed");
                Err(e.into())
            }
        }
    }

    /// Submit deletion of a ride.
    ///
    /// The list is not touched; the ride disappears with the next snapshot.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::validation("Ride id is required"));
        }
        let (collection, _) = self.active_collection()?;
        let document = collection.doc(id);

        self.store.delete(&document).await.map_err(|e| {
            tracing::warn!(document = %document, error = %e, "Ride deletion failed");
            AppError::from(e)
        })?;

        tracing::info!(document = %document, "Ride deleted");
        Ok(())
    }

    fn active_collection(&self) -> Result<(CollectionPath, u64)> {
        let active = self.shared.lock();
        let uid = active
            .uid
            .as_deref()
            .ok_or_else(|| AppError::validation("Not signed in"))?;
        Ok((rides_collection(uid), active.generation))
    }
}

impl Drop for RideListSynchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn release(active: &mut Active) {
    if let Some(mut handle) = active.handle.take() {
        handle.cancel();
    }
    if let Some(pump) = active.pump.take() {
        pump.abort();
    }
}
