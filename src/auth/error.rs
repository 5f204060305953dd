use axum::http::StatusCode;
use thiserror::Error;

use super::password::PolicyViolation;

/// Caller-facing failures of the account workflows.
///
/// Messages are safe to show to end users; the underlying causes are logged
/// where they happen and never carried here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("password may not be blank")]
    BlankPassword,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("{}", join_violations(.0))]
    WeakPassword(Vec<PolicyViolation>),

    #[error("Failed to create account.")]
    RegistrationFailed,

    #[error(
        "An error has occurred processing your request. Please reload the page and try again."
    )]
    ForgotPassword,

    #[error("Error looking up token.")]
    TokenLookup,

    #[error("Error looking up user.")]
    UserLookup,

    #[error("Failed to reset password.")]
    ResetFailed,
}

fn join_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(|violation| violation.message())
        .collect::<Vec<_>>()
        .join(". ")
}

impl AuthError {
    /// True for errors raised before any side effect.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BlankPassword | Self::InvalidEmail | Self::WeakPassword(_)
        )
    }

    /// HTTP status reported for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BlankPassword | Self::InvalidEmail | Self::WeakPassword(_) | Self::TokenLookup => {
                StatusCode::BAD_REQUEST
            }
            Self::RegistrationFailed
            | Self::ForgotPassword
            | Self::UserLookup
            | Self::ResetFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_copy() {
        assert_eq!(
            AuthError::BlankPassword.to_string(),
            "password may not be blank"
        );
        assert_eq!(
            AuthError::ResetFailed.to_string(),
            "Failed to reset password."
        );
        assert_eq!(
            AuthError::InvalidEmail.to_string(),
            "Please enter a valid email address."
        );
    }

    #[test]
    fn weak_password_lists_every_violation() {
        let err = AuthError::WeakPassword(vec![
            PolicyViolation::TooShort,
            PolicyViolation::MissingDigit,
        ]);
        assert_eq!(
            err.to_string(),
            "Password must be at least 8 characters. Password must contain a number"
        );
        assert!(err.is_validation());
        assert!(!AuthError::TokenLookup.is_validation());
    }

    #[test]
    fn status_separates_client_and_server_errors() {
        assert_eq!(AuthError::InvalidEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::TokenLookup.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::UserLookup.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::RegistrationFailed.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
