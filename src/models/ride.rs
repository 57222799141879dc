// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride model and its mapping to store documents.

use crate::db::{fields, Document, DocumentWrite, Fields};
use crate::error::{AppError, Result};
use crate::time_utils::parse_store_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Shown when either location is blank.
pub const MISSING_LOCATION_MESSAGE: &str = "Please enter pickup and drop";

/// A ride as stored in `users/{uid}/rides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRecord {
    /// Store-assigned document id
    pub id: String,
    /// Pickup location (free text)
    pub pickup: String,
    /// Drop location (free text)
    pub drop: String,
    /// Store commit time; the only sort key
    pub created_at: Option<DateTime<Utc>>,
}

impl RideRecord {
    /// Decode a store document.
    ///
    /// Missing or non-string locations become empty strings and an unreadable
    /// `createdAt` becomes `None`, so decoding never fails.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            pickup: doc.get_str(fields::PICKUP).unwrap_or_default().to_string(),
            drop: doc.get_str(fields::DROP).unwrap_or_default().to_string(),
            created_at: doc
                .get_str(fields::CREATED_AT)
                .and_then(parse_store_timestamp),
        }
    }

    /// "Pickup → Drop"
    pub fn route(&self) -> String {
        format!("{} → {}", self.pickup, self.drop)
    }
}

/// A validated ride request, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewRide {
    #[validate(length(min = 1, message = "Please enter pickup and drop"))]
    pub pickup: String,
    #[validate(length(min = 1, message = "Please enter pickup and drop"))]
    pub drop: String,
}

impl NewRide {
    /// Trim both locations and reject blanks.
    pub fn new(pickup: &str, drop: &str) -> Result<Self> {
        let ride = Self {
            pickup: pickup.trim().to_string(),
            drop: drop.trim().to_string(),
        };
        ride.validate()
            .map_err(|_| AppError::validation(MISSING_LOCATION_MESSAGE))?;
        Ok(ride)
    }

    /// Document write with a store-stamped `createdAt`.
    pub fn into_write(self) -> DocumentWrite {
        let mut map = Fields::new();
        map.insert(fields::PICKUP.to_string(), self.pickup.into());
        map.insert(fields::DROP.to_string(), self.drop.into());
        DocumentWrite::new(map).with_server_timestamp(fields::CREATED_AT)
    }
}
