// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile loading and name updates (`users/{uid}`).

use crate::db::{fields, profile_path, DocumentStore, DocumentWrite, Fields};
use crate::error::{AppError, Result};
use crate::models::{Session, UserProfile};
use std::sync::Arc;

/// Reads the profile once per session and writes name changes.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load the profile. Failures are logged and leave the placeholder name.
    pub async fn load(&self, session: &Session) -> UserProfile {
        match self.store.get(&profile_path(&session.uid)).await {
            Ok(doc) => UserProfile::from_document(session, doc.as_ref()),
            Err(e) => {
                tracing::warn!(uid = %session.uid, error = %e, "Failed to load profile");
                UserProfile::placeholder(session)
            }
        }
    }

    /// Merge a new display name into the profile, keeping unrelated fields.
    pub async fn save_name(&self, session: &Session, name: &str) -> Result<UserProfile> {
        let clean = name.trim();
        if clean.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }

        let mut map = Fields::new();
        map.insert(fields::NAME.to_string(), clean.into());
        if let Some(email) = &session.email {
            map.insert(fields::EMAIL.to_string(), email.as_str().into());
        }
        let write = DocumentWrite::new(map).with_server_timestamp(fields::UPDATED_AT);

        self.store
            .upsert_merge(&profile_path(&session.uid), write)
            .await?;

        tracing::info!(uid = %session.uid, "Profile updated");
        Ok(UserProfile {
            uid: session.uid.clone(),
            display_name: clean.to_string(),
            email: session.email.clone(),
        })
    }
}
