// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod auth;
pub mod firebase_auth;
pub mod home;
pub mod memory_auth;
pub mod profile;
pub mod rides;

pub use account::{AccountService, Destination};
pub use auth::{AuthError, AuthProvider};
pub use firebase_auth::FirebaseAuth;
pub use home::HomeSession;
pub use memory_auth::MemoryAuth;
pub use profile::ProfileService;
pub use rides::{RideListState, RideListSynchronizer};
