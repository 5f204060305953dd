//! Registration and password reset endpoints.
//!
//! Bodies are accepted as JSON or url-encoded forms. Errors are returned as
//! plain text with the status from [`AuthError::status`].

pub mod flash;
pub mod password;
pub mod register;
pub mod types;

use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::auth::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_validation() {
            debug!(%status, "Rejected request: {self}");
        } else {
            warn!(%status, "Request failed: {self}");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PolicyViolation;
    use anyhow::Result;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    async fn render(err: AuthError) -> Result<(StatusCode, String)> {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok((status, String::from_utf8(bytes.to_vec())?))
    }

    #[tokio::test]
    async fn validation_errors_are_client_errors() -> Result<()> {
        let err = AuthError::WeakPassword(vec![PolicyViolation::MissingDigit]);
        assert!(err.is_validation());
        let (status, body) = render(err).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Password must contain a number");
        Ok(())
    }

    #[tokio::test]
    async fn workflow_errors_keep_their_status() -> Result<()> {
        assert!(!AuthError::ResetFailed.is_validation());
        let (status, body) = render(AuthError::ResetFailed).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to reset password.");

        let (status, _) = render(AuthError::TokenLookup).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }
}
