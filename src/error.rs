// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent user-facing messages.

use crate::db::StoreError;
use crate::services::auth::AuthError;

/// Application error type.
///
/// Validation errors are raised locally before any remote call. The other
/// variants wrap failures reported by the collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short message suitable for a one-line notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Auth(err) => err.to_string(),
            AppError::Store(err) => {
                tracing::warn!(error = %err, "Store request failed");
                err.to_string()
            }
            AppError::Subscription(msg) => msg.clone(),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                "Something went wrong".to_string()
            }
        }
    }
}

/// Result type alias for app operations
pub type Result<T> = std::result::Result<T, AppError>;
