//! One-shot flash messages stored in the session.
//!
//! A handler pushes a message; the next request that reads the flash drains
//! it, so each message is shown once.

use serde::{Deserialize, Serialize};
use tower_sessions::{session, Session};
use utoipa::ToSchema;

const FLASH_KEY: &str = "flash";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

/// Queue a message for the next flash read.
///
/// # Errors
/// Returns an error if the session store fails.
pub async fn push(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), session::Error> {
    let mut pending = session
        .get::<Vec<FlashMessage>>(FLASH_KEY)
        .await?
        .unwrap_or_default();
    pending.push(FlashMessage {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, pending).await
}

/// Remove and return every pending message.
///
/// # Errors
/// Returns an error if the session store fails.
pub async fn take(session: &Session) -> Result<Vec<FlashMessage>, session::Error> {
    Ok(session
        .remove::<Vec<FlashMessage>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}
