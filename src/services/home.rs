// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in home screen state: the rides list and the profile.

use crate::db::{DocumentId, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::{Session, UserProfile};
use crate::services::profile::ProfileService;
use crate::services::rides::{RideListState, RideListSynchronizer};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the home screen needs for one session.
pub struct HomeSession {
    session: Session,
    rides: RideListSynchronizer,
    profiles: ProfileService,
    profile: UserProfile,
}

impl HomeSession {
    /// Start the rides subscription and load the profile once.
    ///
    /// A failed subscription leaves the session open; the failure stays in
    /// the rides state as its error.
    pub async fn open(store: Arc<dyn DocumentStore>, session: Session) -> Self {
        let rides = RideListSynchronizer::new(store.clone());
        if let Err(e) = rides.start(&session.uid).await {
            tracing::warn!(uid = %session.uid, error = %e, "Rides list unavailable");
        }

        let profiles = ProfileService::new(store);
        let profile = profiles.load(&session).await;

        Self {
            session,
            rides,
            profiles,
            profile,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn rides(&self) -> watch::Receiver<RideListState> {
        self.rides.watch()
    }

    pub fn rides_state(&self) -> RideListState {
        self.rides.state()
    }

    pub async fn book(&self, pickup: &str, drop: &str) -> Result<DocumentId> {
        self.rides.create(pickup, drop).await
    }

    /// Delete the ride shown at 1-based `row` of the current list.
    pub async fn delete_row(&self, row: usize) -> Result<()> {
        let id = row
            .checked_sub(1)
            .and_then(|index| self.rides.state().rides.get(index).map(|r| r.id.clone()))
            .ok_or_else(|| AppError::validation(format!("No ride at row {}", row)))?;
        self.rides.delete(&id).await
    }

    pub async fn rename(&mut self, name: &str) -> Result<&UserProfile> {
        self.profile = self.profiles.save_name(&self.session, name).await?;
        Ok(&self.profile)
    }

    /// Leave the home screen; releases the subscription.
    pub fn close(&self) {
        self.rides.stop();
    }
}
