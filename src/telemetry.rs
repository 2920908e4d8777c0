use std::time::Instant;

use axum::{
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, info_span, warn, Instrument};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use crate::config::LogFormat;
use crate::error::ErrorDetail;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used, and an unknown level
/// falls back to `info`.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));
    let builder = fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn level_directive(level: &str) -> &'static str {
    match level {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "fatal" | "panic" => "error",
        _ => "info",
    }
}

/// Tags each request with an id and logs its outcome.
///
/// Failed responses are logged together with the [`ErrorDetail`] attached by
/// [`ApiError`](crate::error::ApiError).
pub async fn log_requests<B>(request: Request<B>, next: Next<B>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let span = info_span!("request", request_id = %request_id, method = %method, path = %path);
    let mut response = next.run(request).instrument(span).await;

    let status = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;
    let error = response
        .extensions()
        .get::<ErrorDetail>()
        .map(|detail| detail.0.clone())
        .unwrap_or_default();

    if response.status().is_server_error() {
        error!(%request_id, %method, %path, status, duration_ms, %error, "request failed");
    } else if response.status().is_client_error() {
        warn!(%request_id, %method, %path, status, duration_ms, %error, "request rejected");
    } else {
        info!(%request_id, %method, %path, status, duration_ms, "request served");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
