use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::types::RegisterRequest;
use crate::{
    api::payload::Payload,
    auth::{
        models::{Registration, User},
        password::policy_violations,
        utils::{normalize_email, valid_email},
        AuthError, AuthService,
    },
};

#[utoipa::path(
    post,
    path= "/auth/register",
    request_body(content = RegisterRequest, content_type = "application/json"),
    responses (
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid email or password", body = String),
        (status = 500, description = "Account could not be created", body = String),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    Payload(request): Payload<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let username = normalize_email(&request.username);
    if !valid_email(&username) {
        return Err(AuthError::InvalidEmail);
    }

    // Blank passwords are reported by the service with their own message.
    if !request.password.is_empty() {
        let violations = policy_violations(&request.password, &username);
        if !violations.is_empty() {
            debug!(?violations, "rejected weak password");
            return Err(AuthError::WeakPassword(violations));
        }
    }

    let user = service
        .register(Registration {
            username,
            password: request.password,
            name: request.name,
            government_uri: request.government_uri,
            tags: request.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
