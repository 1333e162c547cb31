//! Liveness and readiness checks.

use axum::Extension;
use hyper::StatusCode;

use crate::AppResources;

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

/// Liveness check.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Service liveness check",
    responses(
        (status = 200, description = "Service is running", body = str, content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness check: the database must answer before webhooks are accepted.
#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/readyz",
    tag = MISC_TAG,
    operation_id = "Readiness Check",
    summary = "Database connectivity check",
    responses(
        (status = 200, description = "Database reachable", body = str, content_type = "text/plain", example = "ready"),
        (status = 503, description = "Database unreachable", body = str, content_type = "text/plain")
    )
)]
pub async fn ready(Extension(resources): Extension<AppResources>) -> (StatusCode, &'static str) {
    match resources.db.ping().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(
                name = "api.ready.db_ping_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "Database ping failed"
            );
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
