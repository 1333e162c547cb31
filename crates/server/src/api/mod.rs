//! HTTP surface of the service.
//!
//! - `webhooks` - Email provider webhook ingestion (/api/webhooks/*)
//! - `sends` - Send registration (/api/email-sends)
//! - `analytics` - Reporting (/api/analytics/*)
//! - `members` - Engagement recalculation (/api/members/*)
//! - `health` - Health checks (/healthz, /readyz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod analytics;
pub mod health;
pub mod members;
pub mod openapi;
pub mod sends;
pub mod webhooks;

pub use health::MISC_TAG;

use crate::AppResources;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Builds the application router with all routes and middleware attached.
pub fn build_router(app_resources: AppResources) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .merge(webhooks::router())
        .merge(sends::router())
        .merge(analytics::router())
        .merge(members::router())
        .routes(routes!(health::health))
        .routes(routes!(health::ready))
        .layer(axum::Extension(app_resources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(app_resources))]
pub async fn start_webserver(app_resources: AppResources) -> color_eyre::Result<()> {
    let addr = app_resources.config.listen_addr.clone();
    let router = build_router(app_resources);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        name = "api.start_webserver.listening",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        addr = %addr,
        message = "Server running"
    );
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
