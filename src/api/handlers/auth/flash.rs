use axum::{http::StatusCode, Json};
use tower_sessions::Session;
use tracing::error;

use crate::api::flash::{self, FlashMessage};

#[utoipa::path(
    get,
    path= "/auth/flash",
    responses (
        (status = 200, description = "Pending flash messages, removed once read", body = [FlashMessage]),
    ),
    tag= "auth"
)]
pub async fn flash(session: Session) -> Result<Json<Vec<FlashMessage>>, StatusCode> {
    flash::take(&session).await.map(Json).map_err(|err| {
        error!("failed to read flash messages: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
