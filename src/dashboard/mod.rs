//! # Dashboard - Review API Server
//!
//! Runs an Axum HTTP server exposing the review workflow as JSON endpoints:
//! upload-and-analyse, per-project scoring, submission, and listing. Page
//! rendering lives in the frontend; this server only speaks JSON.
//!
//! Every request passes through a request-id middleware that propagates or
//! mints `x-request-id`, opens a tracing span, and records latency.

mod routes_health;
mod routes_reviews;

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::routing::{get, post};
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Instrument};

use crate::analysis::Analyzer;
use crate::config::ReviewConfig;
use crate::error::Result as ReviewResult;
use crate::prom_metrics::{self, Metrics};
use crate::repository::{MemoryRepository, ReviewRepository};
use crate::review::{ProjectDescriptor, ReviewController};
use crate::db;

/// Largest accepted spreadsheet upload.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Analysis runs synchronously inside the start request, so the request
/// timeout has to cover the slowest expected agent run.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub struct AppState {
    pub controller: ReviewController,
    pub repo: Arc<dyn ReviewRepository>,
    pub prom_metrics: Arc<Metrics>,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Build state over `repo`, timing every analysis run into the metrics registry.
    pub fn new(
        config: &ReviewConfig,
        repo: Arc<dyn ReviewRepository>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Arc<Self> {
        let prom_metrics = Arc::new(Metrics::new());
        let analyzer: Arc<dyn Analyzer> = Arc::new(MeteredAnalyzer {
            inner: analyzer,
            metrics: prom_metrics.clone(),
        });
        Arc::new(AppState {
            controller: config.controller(repo.clone(), analyzer),
            repo,
            prom_metrics,
            upload_dir: config.upload_dir.clone(),
        })
    }
}

/// Records the wall time of each analysis run, successful or not.
struct MeteredAnalyzer {
    inner: Arc<dyn Analyzer>,
    metrics: Arc<Metrics>,
}

#[async_trait]
impl Analyzer for MeteredAnalyzer {
    async fn analyze(&self, title: &str, artifact: &Path) -> ReviewResult<Vec<ProjectDescriptor>> {
        let start = Instant::now();
        let result = self.inner.analyze(title, artifact).await;
        self.metrics
            .analysis_duration
            .observe(start.elapsed().as_secs_f64());
        result
    }
}

/// Middleware that records HTTP request duration into the Prometheus histogram,
/// generates (or propagates) a request ID for correlation, and wraps the
/// request in a tracing span using `.instrument()` for proper async propagation.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Collapse UUID path segments into a placeholder to keep histogram labels bounded.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if uuid::Uuid::parse_str(seg).is_ok() {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/review/start",
            post(routes_reviews::handler_api_review_start),
        )
        .route(
            "/api/review/project/score",
            post(routes_reviews::handler_api_project_score),
        )
        .route("/api/reviews", get(routes_reviews::handler_api_reviews_list))
        .route(
            "/api/reviews/completed",
            get(routes_reviews::handler_api_reviews_completed),
        )
        .route("/api/reviews/{id}", get(routes_reviews::handler_api_review_get))
        .route(
            "/api/reviews/{id}/submit",
            post(routes_reviews::handler_api_review_submit),
        )
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .with_state(state)
}

/// Connect storage, build the router, and serve until the process is stopped.
pub async fn run(port: u16, config: &ReviewConfig) -> Result<()> {
    let repo: Arc<dyn ReviewRepository> = match &config.database_url {
        Some(url) => Arc::new(db::Database::connect(url).await?),
        None => {
            warn!("no DATABASE_URL configured; reviews are kept in memory only");
            Arc::new(MemoryRepository::new())
        }
    };
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = AppState::new(config, repo, Arc::new(config.analyzer()));
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        port,
        agent_dir = %config.agent_dir.display(),
        upload_dir = %config.upload_dir.display(),
        "review server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("review server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}
