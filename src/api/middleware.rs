//! Cross-cutting request middleware.
//!
//! [`apply`] installs, outermost first: flash-message sessions, request body
//! limits, `Cache-Control`, response compression, CORS and request logging.
//! The stack is fixed once the router is built.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{
        header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::{SetRequestHeaderLayer, SetResponseHeaderLayer},
    trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, MemoryStore, SessionManagerLayer};
use tracing::{info_span, warn, Span};
use ulid::Ulid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;
const NO_STORE: &str = "no-store";

#[derive(Clone, Debug)]
pub struct HttpConfig {
    cors_origins: Vec<String>,
    body_limit_bytes: usize,
    cache_control: String,
    secure_cookies: bool,
}

impl HttpConfig {
    /// Default config: any origin, 1 MiB bodies, `no-store` caching.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cors_origins: vec!["*".to_string()],
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            cache_control: NO_STORE.to_string(),
            secure_cookies: false,
        }
    }

    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    #[must_use]
    pub fn with_body_limit_bytes(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    #[must_use]
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_bytes
    }

    #[must_use]
    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap `router` with the middleware stack.
#[must_use]
pub fn apply(router: Router, config: &HttpConfig) -> Router {
    let cache_control = HeaderValue::from_str(config.cache_control())
        .unwrap_or_else(|_| HeaderValue::from_static(NO_STORE));

    // Each `layer` call wraps everything added before it, so the calls below
    // go from the innermost layer (logging) to the outermost (flash).
    router
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestHeaderLayer::if_not_present(
            HeaderName::from_static(REQUEST_ID_HEADER),
            |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
        ))
        .layer(cors_layer(config.cors_origins()))
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(CACHE_CONTROL, cache_control))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .layer(
            SessionManagerLayer::new(MemoryStore::default())
                .with_secure(config.secure_cookies)
                .with_same_site(SameSite::Lax),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST]);

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Ignoring invalid CORS origin {origin}: {err}");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::{
        http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, StatusCode},
        routing::{get, post},
    };
    use tower::ServiceExt;

    fn router(config: &HttpConfig) -> Router {
        apply(
            Router::new()
                .route("/", get(|| async { "hello" }))
                .route("/echo", post(|body: String| async move { body })),
            config,
        )
    }

    #[test]
    fn config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.cors_origins(), ["*".to_string()]);
        assert_eq!(config.cache_control(), "no-store");
        assert_eq!(config.body_limit_bytes(), 1024 * 1024);
    }

    #[tokio::test]
    async fn responses_are_not_cached_and_carry_request_id() -> Result<()> {
        let response = router(&HttpConfig::new())
            .oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        assert!(request_id.is_some_and(|id| Ulid::from_string(&id).is_ok()));
        Ok(())
    }

    #[tokio::test]
    async fn client_request_id_is_kept() -> Result<()> {
        let response = router(&HttpConfig::new())
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER),
            Some(&HeaderValue::from_static("req-123"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() -> Result<()> {
        let config =
            HttpConfig::new().with_cors_origins(vec!["https://openopps.dev".to_string()]);

        let allowed = router(&config)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "https://openopps.dev")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            allowed.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://openopps.dev"))
        );

        let denied = router(&config)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "https://evil.example")
                    .body(Body::empty())?,
            )
            .await?;
        assert!(denied.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() -> Result<()> {
        let config = HttpConfig::new().with_body_limit_bytes(8);
        let response = router(&config)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .body(Body::from("this body is too long"))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        Ok(())
    }

    #[tokio::test]
    async fn responses_are_compressed_when_accepted() -> Result<()> {
        let app = apply(
            Router::new().route("/", get(|| async { "a".repeat(4096) })),
            &HttpConfig::new(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("accept-encoding", "gzip")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            response.headers().get("content-encoding"),
            Some(&HeaderValue::from_static("gzip"))
        );
        Ok(())
    }
}
