// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process authentication provider for offline runs and tests.

use crate::models::Session;
use crate::services::auth::{AuthError, AuthProvider, SessionSlot};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    email: String,
    salt: String,
    password_hash: String,
}

/// Accounts kept in memory, keyed by lower-cased email.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: DashMap<String, Account>,
    session: SessionSlot,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn current_session(&self) -> Option<Session> {
        self.session.get()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = {
            let account = self
                .accounts
                .get(&account_key(email))
                .ok_or(AuthError::InvalidCredentials)?;
            if hash_password(&account.salt, password) != account.password_hash {
                return Err(AuthError::InvalidCredentials);
            }
            Session::new(account.uid.clone(), Some(account.email.clone()))
        };

        tracing::info!(uid = %session.uid, "Signed in");
        self.session.set(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let session = match self.accounts.entry(account_key(email)) {
            Entry::Occupied(_) => return Err(AuthError::EmailAlreadyInUse),
            Entry::Vacant(slot) => {
                let salt = uuid::Uuid::new_v4().simple().to_string();
                let account = Account {
                    uid: uuid::Uuid::new_v4().simple().to_string(),
                    email: email.trim().to_string(),
                    password_hash: hash_password(&salt, password),
                    salt,
                };
                let session = Session::new(account.uid.clone(), Some(account.email.clone()));
                slot.insert(account);
                session
            }
        };

        tracing::info!(uid = %session.uid, "Account created");
        self.session.set(Some(session.clone()));
        Ok(session)
    }

    fn sign_out(&self) {
        if let Some(session) = self.session.get() {
            tracing::info!(uid = %session.uid, "Signed out");
        }
        self.session.set(None);
    }
}
