//! Error taxonomy and the boundary mapping to external responses.
//!
//! Failure causes stay distinguishable internally so they can be logged,
//! but every authentication failure collapses to one of two opaque
//! messages at the boundary: login rejects (including rate-limited ones)
//! all read "Login failed.", and token problems all read "Authentication
//! required". Callers cannot tell the sub-cases apart.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

/// The single message for every login reject, whatever the cause.
pub const LOGIN_FAILED: &str = "Login failed.";

/// The single message for every token/header problem.
pub const AUTH_REQUIRED: &str = "Authentication required";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },
    #[error("account already exists")]
    DuplicateAccount,
    #[error("rate limited")]
    RateLimited,
    #[error("unknown account")]
    UnknownAccount,
    #[error("password mismatch")]
    BadPassword,
    #[error("two-factor code required but absent")]
    MissingTwoFactorCode,
    #[error("two-factor code rejected")]
    BadTwoFactorCode,
    #[error("two-factor enrollment has not been started")]
    TwoFactorNotEnrolled,
    #[error("missing authorization header")]
    MissingAuthorization,
    #[error("malformed authorization header")]
    MalformedAuthorization,
    #[error("session token expired")]
    ExpiredToken,
    #[error("session token invalid")]
    InvalidToken,
    #[error("account no longer exists")]
    AccountMissing,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Map the internal taxonomy to what the caller is allowed to see.
    #[must_use]
    pub fn external(&self) -> (StatusCode, String) {
        match self {
            Self::Validation { field, reason } => (
                StatusCode::BAD_REQUEST,
                format!("Invalid {field}: {reason}"),
            ),
            Self::DuplicateAccount => (
                StatusCode::CONFLICT,
                "Account already exists".to_string(),
            ),
            // One opaque message for every login reject, rate limiting
            // included, so callers cannot probe accounts or the limiter.
            Self::RateLimited
            | Self::UnknownAccount
            | Self::BadPassword
            | Self::MissingTwoFactorCode
            | Self::BadTwoFactorCode => (StatusCode::UNAUTHORIZED, LOGIN_FAILED.to_string()),
            Self::TwoFactorNotEnrolled => (
                StatusCode::BAD_REQUEST,
                "Two-factor enrollment has not been started".to_string(),
            ),
            Self::MissingAuthorization
            | Self::MalformedAuthorization
            | Self::ExpiredToken
            | Self::InvalidToken
            | Self::AccountMissing => (StatusCode::UNAUTHORIZED, AUTH_REQUIRED.to_string()),
            Self::Configuration(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Configuration(_) | AuthError::Internal(_) => {
                error!("auth operation failed: {self:#}");
            }
            other => debug!("authentication rejected: {other}"),
        }
        self.external().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_rejects_are_indistinguishable() {
        let causes = [
            AuthError::RateLimited,
            AuthError::UnknownAccount,
            AuthError::BadPassword,
            AuthError::MissingTwoFactorCode,
            AuthError::BadTwoFactorCode,
        ];
        for cause in causes {
            let (status, message) = cause.external();
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, LOGIN_FAILED);
        }
    }

    #[test]
    fn token_failures_are_indistinguishable() {
        let causes = [
            AuthError::MissingAuthorization,
            AuthError::MalformedAuthorization,
            AuthError::ExpiredToken,
            AuthError::InvalidToken,
        ];
        for cause in causes {
            let (status, message) = cause.external();
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, AUTH_REQUIRED);
        }
    }

    #[test]
    fn validation_errors_carry_field_detail() {
        let err = AuthError::Validation {
            field: "email",
            reason: "must be a valid email address",
        };
        let (status, message) = err.external();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("email"));
    }

    #[test]
    fn duplicate_account_is_a_conflict() {
        let (status, message) = AuthError::DuplicateAccount.external();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "Account already exists");
    }

    #[test]
    fn internal_causes_stay_distinguishable_in_logs() {
        // Display differs even though the external message matches.
        assert_ne!(
            AuthError::RateLimited.to_string(),
            AuthError::BadPassword.to_string()
        );
    }
}
