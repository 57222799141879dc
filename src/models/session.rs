//! Authenticated session.

use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Stable user id (profile document id and rides parent)
    pub uid: String,
    /// Email address, if the provider has one
    pub email: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}
