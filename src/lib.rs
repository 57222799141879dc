// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GoRide: book, list and cancel simple rides.
//!
//! This crate provides the client core of a small ride-booking app: email
//! and password accounts, a profile name, and a per-user rides list that
//! stays live against a document store.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::AuthProvider;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
}
