use std::path::Path;

use axum::{middleware, Extension, Router};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;

use crate::cancel::CallBudget;
use crate::subscriptions::{self, SharedStore};
use crate::telemetry;

/// Subscription endpoints plus the static API description under `docs_dir`.
///
/// Requests still running after the budget's timeout, body reading included,
/// are answered with `408 Request Timeout`.
pub fn api_routes(store: SharedStore, budget: CallBudget, docs_dir: &Path) -> Router {
    let timeout = TimeoutLayer::new(budget.timeout());
    Router::new()
        .merge(subscriptions::routes())
        .route_service("/swagger.yaml", ServeFile::new(docs_dir.join("swagger.yaml")))
        .nest_service("/docs", ServeDir::new(docs_dir))
        .layer(timeout)
        .layer(Extension(store))
        .layer(Extension(budget))
        .layer(middleware::from_fn(telemetry::log_requests))
}
