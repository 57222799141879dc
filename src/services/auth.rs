// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication provider port.

use crate::models::Session;
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

/// Errors returned by an authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("The email address is already in use by another account")]
    EmailAlreadyInUse,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    /// Provider message we have no mapping for, passed through verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl AuthError {
    /// Map an Identity Toolkit error message (`CODE` or `CODE : detail`).
    pub fn from_provider_message(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            c if c.starts_with("WEAK_PASSWORD") => Self::WeakPassword,
            _ => Self::Rejected(message.to_string()),
        }
    }
}

/// Email/password authentication with a single current session.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_session(&self) -> Option<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account. On success the new user is signed in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    fn sign_out(&self);
}

/// Holder for the provider's current session.
#[derive(Debug, Default)]
pub struct SessionSlot(RwLock<Option<Session>>);

impl SessionSlot {
    pub fn get(&self) -> Option<Session> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, session: Option<Session>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}
