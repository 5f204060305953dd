use crate::{
    api::handlers::{health, root},
    auth::{AuthConfig, AuthService, PgStore},
    notification::LogEmailSender,
};
use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    routing::{get, options},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod flash;
pub(crate) mod handlers;
pub mod middleware;
mod openapi;
pub mod payload;

pub use middleware::HttpConfig;
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the application: documented routes, `/`, Swagger UI and the
/// middleware stack.
#[must_use]
pub fn app(service: Arc<AuthService>, http: &HttpConfig) -> Router {
    let (router, openapi) = router().split_for_parts();

    let router = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(Extension(service));

    middleware::apply(router, http)
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or to start the server
pub async fn new(
    port: u16,
    dsn: String,
    auth_config: AuthConfig,
    http_config: HttpConfig,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let service = Arc::new(AuthService::new(
        Arc::new(PgStore::new(pool)),
        auth_config,
        Arc::new(LogEmailSender),
    ));

    let app = app(service, &http_config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}
