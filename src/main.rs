use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tokio_util::sync::CancellationToken;

use subscription_service::cancel::CallBudget;
use subscription_service::config::Config;
use subscription_service::routes::api_routes;
use subscription_service::subscriptions::{PgSubscriptionStore, SharedStore};
use subscription_service::{db, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    telemetry::init_tracing(&config.log_level, config.log_format);
    tracing::debug!(?config, "configuration loaded");

    let pool = db::connect(&config).await.map_err(|error| {
        tracing::error!(?error, "database unavailable, refusing to start");
        error
    })?;

    let store: SharedStore = Arc::new(PgSubscriptionStore::new(pool.clone()));
    // Cancelled only once the shutdown grace period runs out.
    let force_close = CancellationToken::new();
    let budget = CallBudget::new(force_close.clone(), config.request_timeout);

    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();
    let app = api_routes(store, budget, &config.docs_dir)
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        )
        .layer(prometheus_layer);

    let addr = config.bind_addr().context("invalid bind address")?;
    let stop_accepting = CancellationToken::new();
    tokio::spawn(forward_shutdown_signal(stop_accepting.clone()));

    tracing::info!(%addr, "subscription service starting");
    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {addr}"))?
        .serve(app.into_make_service())
        .with_graceful_shutdown({
            let stop_accepting = stop_accepting.clone();
            async move { stop_accepting.cancelled().await }
        });
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.context("server stopped unexpectedly")?,
        _ = grace_expired(&stop_accepting, config.shutdown_grace) => {
            tracing::warn!(
                grace = ?config.shutdown_grace,
                "in-flight requests did not finish in time, forcing shutdown"
            );
            force_close.cancel();
        }
    }

    pool.close().await;
    tracing::info!("subscription service stopped");
    Ok(())
}

async fn grace_expired(stop_accepting: &CancellationToken, grace: Duration) {
    stop_accepting.cancelled().await;
    tokio::time::sleep(grace).await;
}

/// Cancels `stop_accepting` on Ctrl+C or SIGTERM.
async fn forward_shutdown_signal(stop_accepting: CancellationToken) {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(?error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(?error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
    stop_accepting.cancel();
}
