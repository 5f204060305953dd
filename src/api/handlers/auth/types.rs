use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::payload::deserialize_ids;

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    /// Email address used as the username.
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub government_uri: Option<String>,
    /// Tag ids, as a JSON array or a comma separated form value.
    #[serde(default, alias = "tags[]", deserialize_with = "deserialize_ids")]
    pub tags: Vec<i64>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ForgotRequest {
    pub username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ForgotResponse {
    pub success: bool,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ResetRequest {
    pub token: String,
    pub password: String,
}
