// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in and launch routing.
//!
//! Credentials are checked locally first; the provider is only called with
//! input that passes.

use crate::error::{AppError, Result};
use crate::models::Session;
use crate::services::auth::AuthProvider;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

const INVALID_LOGIN_MESSAGE: &str = "Please enter a valid email and password";

/// Where the app goes after the splash screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Login,
    Home(Session),
}

#[derive(Debug, Validate)]
struct SignUpForm {
    #[validate(email(message = "Please enter a valid email."))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    confirm: String,
}

#[derive(Debug, Validate)]
struct SignInForm {
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
}

/// First failing field's message, checked in form order.
fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let by_field = errors.field_errors();
    order
        .iter()
        .filter_map(|field| by_field.get(*field))
        .flat_map(|errors| errors.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string())
}

/// Authentication flows on top of an [`AuthProvider`].
#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth }
    }

    /// Home if a session survives from before, login otherwise.
    pub fn launch_destination(&self) -> Destination {
        match self.auth.current_session() {
            Some(session) => Destination::Home(session),
            None => Destination::Login,
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.auth.current_session()
    }

    pub async fn sign_up(&self, email: &str, password: &str, confirm: &str) -> Result<Session> {
        let form = SignUpForm {
            email: email.trim().to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
        };
        form.validate().map_err(|errors| {
            AppError::validation(first_message(&errors, &["email", "password", "confirm"]))
        })?;

        Ok(self.auth.sign_up(&form.email, &form.password).await?)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let form = SignInForm {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        form.validate()
            .map_err(|_| AppError::validation(INVALID_LOGIN_MESSAGE))?;

        Ok(self.auth.sign_in(&form.email, &form.password).await?)
    }

    pub fn sign_out(&self) {
        self.auth.sign_out();
    }
}
