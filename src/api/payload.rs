//! Request body extractor accepting JSON or url-encoded forms.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

/// Decodes the body as a form when the client sent
/// `application/x-www-form-urlencoded`, and as JSON otherwise.
///
/// Repeated form keys (`tags[]=1&tags[]=2`) collect into a sequence.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(value));
        }

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                Err((StatusCode::BAD_REQUEST, rejection.body_text()).into_response())
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdList {
    Many(Vec<Id>),
    One(Id),
}

/// Accept ids as a JSON array, repeated form keys or comma separated values.
pub(crate) fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = match IdList::deserialize(deserializer)? {
        IdList::Many(ids) => ids,
        IdList::One(id) => vec![id],
    };

    let mut parsed = Vec::with_capacity(ids.len());
    for id in ids {
        match id {
            Id::Number(id) => parsed.push(id),
            Id::Text(raw) => {
                for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
                    parsed.push(
                        part.parse::<i64>()
                            .map_err(<D::Error as serde::de::Error>::custom)?,
                    );
                }
            }
        }
    }
    Ok(parsed)
}
