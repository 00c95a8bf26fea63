//! API server — mounts the REST routes and the Prometheus metrics exporter.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use raffle_core::config::CampaignBook;
use raffle_core::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP server exposing the forecast and evaluation endpoints.
pub struct ApiServer {
    config: AppConfig,
    book: Arc<CampaignBook>,
}

impl ApiServer {
    pub fn new(config: AppConfig, book: Arc<CampaignBook>) -> Self {
        Self { config, book }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            book: self.book.clone(),
            defaults: self.config.forecast_defaults.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Engine endpoints
            .route("/v1/forecast", post(rest::handle_forecast))
            .route("/v1/evaluate", post(rest::handle_evaluate))
            .route("/v1/evaluate-phase", post(rest::handle_evaluate_phase))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive for the lifetime of the process.
        std::mem::forget(handle);
        Ok(())
    }
}
