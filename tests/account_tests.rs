// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in and launch routing with the in-memory provider.

use goride::error::AppError;
use goride::services::{AccountService, AuthError, Destination, MemoryAuth};
use std::sync::Arc;

fn setup() -> (Arc<MemoryAuth>, AccountService) {
    let auth = Arc::new(MemoryAuth::new());
    let accounts = AccountService::new(auth.clone());
    (auth, accounts)
}

#[tokio::test]
async fn test_launch_routes_on_existing_session() {
    let (_, accounts) = setup();
    assert_eq!(accounts.launch_destination(), Destination::Login);

    let session = accounts
        .sign_up("rider@example.com", "secret1", "secret1")
        .await
        .unwrap();
    assert_eq!(accounts.launch_destination(), Destination::Home(session));

    accounts.sign_out();
    assert_eq!(accounts.launch_destination(), Destination::Login);
    assert!(accounts.current_session().is_none());
}

#[tokio::test]
async fn test_sign_up_validation_messages() {
    let (auth, accounts) = setup();

    let cases = [
        ("not-an-email", "secret1", "secret1", "Please enter a valid email."),
        ("a@b.co", "12345", "12345", "Password must be at least 6 characters."),
        ("a@b.co", "secret1", "secret2", "Passwords do not match."),
    ];
    for (email, password, confirm, expected) in cases {
        let err = accounts.sign_up(email, password, confirm).await.unwrap_err();
        assert!(err.is_validation(), "{} should fail locally", email);
        assert_eq!(err.user_message(), expected);
    }

    assert_eq!(auth.account_count(), 0);
}

#[tokio::test]
async fn test_sign_up_reports_email_first() {
    let (_, accounts) = setup();
    let err = accounts.sign_up("bad", "123", "456").await.unwrap_err();
    assert_eq!(err.user_message(), "Please enter a valid email.");
}

#[tokio::test]
async fn test_sign_in_validation_and_provider_errors() {
    let (_, accounts) = setup();
    accounts
        .sign_up("rider@example.com", "secret1", "secret1")
        .await
        .unwrap();
    accounts.sign_out();

    for (email, password) in [("", "secret1"), ("rider@example.com", "123")] {
        let err = accounts.sign_in(email, password).await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter a valid email and password");
    }

    let err = accounts
        .sign_in("rider@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));

    let session = accounts
        .sign_in(" rider@example.com ", "secret1")
        .await
        .unwrap();
    assert_eq!(session.email.as_deref(), Some("rider@example.com"));
}

#[tokio::test]
async fn test_duplicate_sign_up_is_rejected_by_provider() {
    let (auth, accounts) = setup();
    accounts
        .sign_up("rider@example.com", "secret1", "secret1")
        .await
        .unwrap();

    let err = accounts
        .sign_up("Rider@Example.com", "secret2", "secret2")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::EmailAlreadyInUse)));
    assert_eq!(auth.account_count(), 1);
}
