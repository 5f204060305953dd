use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::types::{ForgotRequest, ForgotResponse, ResetRequest};
use crate::{
    api::{
        flash::{self, FlashLevel},
        payload::Payload,
    },
    auth::{
        models::CheckedToken, password::policy_violations, utils::normalize_email, AuthError,
        AuthService,
    },
};

const RESET_DONE: &str = "Your password has been reset.";

#[utoipa::path(
    post,
    path= "/auth/forgot",
    request_body(content = ForgotRequest, content_type = "application/json"),
    responses (
        (status = 200, description = "Request accepted, whether or not the account exists", body = ForgotResponse),
        (status = 400, description = "Invalid email", body = String),
        (status = 500, description = "Reset token could not be stored", body = String),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn forgot(
    service: Extension<Arc<AuthService>>,
    Payload(request): Payload<ForgotRequest>,
) -> Result<Json<ForgotResponse>, AuthError> {
    service
        .forgot_password(&normalize_email(&request.username))
        .await?;

    Ok(Json(ForgotResponse { success: true }))
}

#[utoipa::path(
    get,
    path= "/auth/reset/{token}",
    params(("token" = String, Path, description = "Password reset token")),
    responses (
        (status = 200, description = "Token is valid", body = CheckedToken),
        (status = 400, description = "Token is unknown, used or expired", body = String),
        (status = 500, description = "Token owner could not be loaded", body = String),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn check_token(
    service: Extension<Arc<AuthService>>,
    Path(token): Path<String>,
) -> Result<Json<CheckedToken>, AuthError> {
    service.check_token(&token).await.map(Json)
}

#[utoipa::path(
    post,
    path= "/auth/reset",
    request_body(content = ResetRequest, content_type = "application/json"),
    responses (
        (status = 204, description = "Password reset"),
        (status = 400, description = "Invalid token or weak password", body = String),
        (status = 500, description = "Password could not be reset", body = String),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn reset(
    service: Extension<Arc<AuthService>>,
    session: Session,
    Payload(request): Payload<ResetRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let mut checked = service.check_token(&request.token).await?;

    if request.password.is_empty() {
        return Err(AuthError::BlankPassword);
    }
    let violations = policy_violations(&request.password, &checked.email);
    if !violations.is_empty() {
        return Err(AuthError::WeakPassword(violations));
    }

    service
        .reset_password(&mut checked, &request.password)
        .await?;

    if let Err(err) = flash::push(&session, FlashLevel::Success, RESET_DONE).await {
        warn!("failed to store flash message: {err}");
    }

    Ok(StatusCode::NO_CONTENT)
}
