// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GoRide terminal client
//!
//! Signs a user in and keeps their rides list live against the configured
//! document store.

use goride::{
    config::{Backend, Config, ConfigError},
    db::{DocumentStore, FirestoreStore, MemoryStore},
    services::{AuthProvider, FirebaseAuth, MemoryAuth},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(backend = %config.backend, "Starting GoRide");

    let (store, auth): (Arc<dyn DocumentStore>, Arc<dyn AuthProvider>) = match config.backend {
        Backend::Memory => {
            tracing::info!("Using in-memory store and auth (nothing is persisted)");
            (Arc::new(MemoryStore::new()), Arc::new(MemoryAuth::new()))
        }
        Backend::Firestore => {
            let api_key = config
                .firebase_api_key
                .clone()
                .ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
            let store = FirestoreStore::new(&config.gcp_project_id).await?;
            (Arc::new(store), Arc::new(FirebaseAuth::new(api_key)))
        }
    };

    let state = AppState {
        config,
        store,
        auth,
    };

    goride::cli::run(&state).await
}

/// Initialize logging on stderr, so it never interleaves with client output.
///
/// Set LOG_FORMAT=json for structured output.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,goride=info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let format = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(format).init();
}
