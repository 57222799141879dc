// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod ride;
pub mod session;

pub use profile::UserProfile;
pub use ride::{NewRide, RideRecord};
pub use session::Session;
