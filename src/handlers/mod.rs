//! HTTP request handlers for tierroute

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::router::ClassificationRouter;
use crate::stats::Stats;
use crate::upstream::UpstreamClient;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod messages;
pub mod metrics;
pub mod passthrough;
pub mod prompt;
pub mod stats;

/// Largest request body accepted by any route (Messages API payloads may
/// carry base64 images)
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across all handlers
///
/// All fields are Arc'd (or internally Arc'd) for cheap cloning across Axum
/// handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    router: Arc<ClassificationRouter>,
    stats: Arc<Stats>,
    metrics: Arc<Metrics>,
    upstream: UpstreamClient,
    started_at: Instant,
}

impl AppState {
    /// Create state with a heuristic-only classification router
    pub fn new(config: Config) -> AppResult<Self> {
        let config = Arc::new(config);
        let router = ClassificationRouter::new(config.clone());
        Self::with_router(config, router)
    }

    /// Create state around an already-built classification router
    ///
    /// `router` should share `config`; `main` uses this after probing the
    /// external scorer.
    pub fn with_router(config: Arc<Config>, router: ClassificationRouter) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to register metrics: {}", e)))?;
        let upstream = UpstreamClient::new(&config.upstream)?;

        Ok(Self {
            config,
            router: Arc::new(router),
            stats: Arc::new(Stats::new()),
            metrics: Arc::new(metrics),
            upstream,
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &ClassificationRouter {
        &self.router
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Seconds since the state was built
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

/// Build the full application router
///
/// Unmatched paths, and unsupported methods on known paths, go to the
/// pass-through forwarder.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/messages",
            post(messages::handler).fallback(passthrough::handler),
        )
        .route(
            "/_stats",
            get(stats::handler).fallback(passthrough::handler),
        )
        .route(
            "/_health",
            get(health::handler).fallback(passthrough::handler),
        )
        .route(
            "/metrics",
            get(metrics::handler).fallback(passthrough::handler),
        )
        .fallback(passthrough::handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
