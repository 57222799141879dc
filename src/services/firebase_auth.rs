// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Email/password sign-up (`accounts:signUp`)
//! - Email/password sign-in (`accounts:signInWithPassword`)
//! - The Auth emulator via FIREBASE_AUTH_EMULATOR_HOST

use crate::models::Session;
use crate::services::auth::{AuthError, AuthProvider, SessionSlot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Firebase Authentication provider.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: SessionSlot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    /// Create a client for the project owning `api_key`.
    ///
    /// For local development with the emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => IDENTITY_TOOLKIT_URL.to_string(),
        };
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            session: SessionSlot::default(),
        }
    }

    async fn password_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let envelope: ErrorEnvelope = response.json().await.map_err(|e| {
                AuthError::Rejected(format!("Auth request failed ({}): {}", status, e))
            })?;
            tracing::warn!(endpoint, status = %status, code = %envelope.error.message, "Auth request rejected");
            return Err(AuthError::from_provider_message(&envelope.error.message));
        }

        let body: PasswordResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Network(format!("Invalid auth response: {}", e)))?;

        let session = Session::new(body.local_id, body.email);
        self.session.set(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    fn current_session(&self) -> Option<Session> {
        self.session.get()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .password_request("signInWithPassword", email, password)
            .await?;
        tracing::info!(uid = %session.uid, "Signed in");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.password_request("signUp", email, password).await?;
        tracing::info!(uid = %session.uid, "Account created");
        Ok(session)
    }

    fn sign_out(&self) {
        self.session.set(None);
        tracing::info!("Signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(PasswordRequest {
            email: "a@b.co",
            password: "secret1",
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "email": "a@b.co",
                "password": "secret1",
                "returnSecureToken": true,
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"kind":"identitytoolkit#VerifyPasswordResponse","localId":"abc123",
            "email":"a@b.co","idToken":"tok","registered":true,"expiresIn":"3600"}"#;
        let body: PasswordResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.local_id, "abc123");
        assert_eq!(body.email.as_deref(), Some("a@b.co"));

        let json = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(
            AuthError::from_provider_message(&envelope.error.message),
            AuthError::EmailAlreadyInUse
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let auth = FirebaseAuth::with_base_url("key".into(), "http://127.0.0.1:9/v1".into());
        let err = auth.sign_in("a@b.co", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(auth.current_session().is_none());
    }
}
