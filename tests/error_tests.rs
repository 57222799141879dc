// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use goride::db::StoreError;
use goride::error::AppError;
use goride::services::AuthError;

#[test]
fn test_validation_message_is_shown_verbatim() {
    let err = AppError::validation("Please enter pickup and drop");
    assert!(err.is_validation());
    assert_eq!(err.user_message(), "Please enter pickup and drop");
}

#[test]
fn test_auth_errors_pass_through() {
    let err = AppError::from(AuthError::EmailAlreadyInUse);
    assert!(!err.is_validation());
    assert_eq!(
        err.user_message(),
        "The email address is already in use by another account"
    );

    let err = AppError::from(AuthError::Rejected("TOO_MANY_ATTEMPTS_TRY_LATER".into()));
    assert_eq!(err.user_message(), "TOO_MANY_ATTEMPTS_TRY_LATER");
}

#[test]
fn test_store_errors_keep_description() {
    let err = AppError::from(StoreError::Unavailable("offline".into()));
    assert!(err.user_message().contains("offline"));
}

#[test]
fn test_internal_error_hides_details() {
    let err = AppError::from(anyhow::anyhow!("secret connection string"));
    assert_eq!(err.user_message(), "Something went wrong");
}

#[test]
fn test_store_error_classification() {
    assert!(matches!(
        StoreError::from_message("status: PermissionDenied, message: rules"),
        StoreError::PermissionDenied(_)
    ));
    assert!(matches!(
        StoreError::from_message("UNAVAILABLE: connection refused"),
        StoreError::Unavailable(_)
    ));
    assert!(matches!(
        StoreError::from_message("something else"),
        StoreError::Backend(_)
    ));
}

#[test]
fn test_provider_message_mapping() {
    assert_eq!(
        AuthError::from_provider_message("INVALID_LOGIN_CREDENTIALS"),
        AuthError::InvalidCredentials
    );
    assert_eq!(
        AuthError::from_provider_message(
            "WEAK_PASSWORD : Password should be at least 6 characters"
        ),
        AuthError::WeakPassword
    );
}

#[test]
fn test_subscription_error_from_rides_state() {
    let state = goride::services::RideListState {
        error: Some("Connection lost".into()),
        ..Default::default()
    };
    let err = state.subscription_error().unwrap();
    assert!(matches!(err, AppError::Subscription(_)));
    assert_eq!(err.user_message(), "Connection lost");

    assert!(goride::services::RideListState::default()
        .subscription_error()
        .is_none());
}
