//! # Prometheus Metrics - Review Workflow Exposition
//!
//! Exposes reviewdesk operational metrics in the Prometheus text exposition
//! format for scraping by Prometheus, Grafana Agent, or any
//! OpenMetrics-compatible collector.
//!
//! ## Metrics Exposed
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `reviewdesk_reviews_started_total` | Counter | - | Reviews created |
//! | `reviewdesk_reviews_completed_total` | Counter | - | Reviews submitted |
//! | `reviewdesk_reviews_failed_total` | Counter | `stage` | Reviews ended in `failed` |
//! | `reviewdesk_scores_recorded_total` | Counter | - | Human scores written |
//! | `reviewdesk_analysis_duration_seconds` | Histogram | - | Analysis backend wall time |
//! | `reviewdesk_http_request_duration_seconds` | Histogram | `method`, `path` | API latency |
//!
//! The `/metrics` endpoint renders the current registry state on each scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Where a review failed: `analysis` or `ingestion`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct StageLabel {
    pub stage: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

/// Thread-safe metrics registry for the review server.
///
/// All fields use atomic types and are safe to update from any async task.
pub struct Metrics {
    pub registry: Registry,
    pub reviews_started: Counter,
    pub reviews_completed: Counter,
    pub reviews_failed: Family<StageLabel, Counter>,
    pub scores_recorded: Counter,
    pub analysis_duration: Histogram,
    pub http_request_duration: Family<HttpLabel, Histogram>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let reviews_started = Counter::default();
        registry.register(
            "reviewdesk_reviews_started",
            "Reviews created",
            reviews_started.clone(),
        );

        let reviews_completed = Counter::default();
        registry.register(
            "reviewdesk_reviews_completed",
            "Reviews submitted as completed",
            reviews_completed.clone(),
        );

        let reviews_failed = Family::<StageLabel, Counter>::default();
        registry.register(
            "reviewdesk_reviews_failed",
            "Reviews marked failed, by stage",
            reviews_failed.clone(),
        );

        let scores_recorded = Counter::default();
        registry.register(
            "reviewdesk_scores_recorded",
            "Human scores recorded",
            scores_recorded.clone(),
        );

        // 1s .. ~17min
        let analysis_duration = Histogram::new(exponential_buckets(1.0, 2.0, 11));
        registry.register(
            "reviewdesk_analysis_duration_seconds",
            "Wall time of one analysis backend run",
            analysis_duration.clone(),
        );

        let http_request_duration = Family::<HttpLabel, Histogram>::new_with_constructor(
            http_histogram as fn() -> Histogram,
        );
        registry.register(
            "reviewdesk_http_request_duration_seconds",
            "HTTP request latency",
            http_request_duration.clone(),
        );

        Self {
            registry,
            reviews_started,
            reviews_completed,
            reviews_failed,
            scores_recorded,
            analysis_duration,
            http_request_duration,
        }
    }

    pub fn record_failure(&self, stage: &str) {
        self.reviews_failed
            .get_or_create(&StageLabel {
                stage: stage.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if let Err(e) = encode(&mut buf, &self.registry) {
            tracing::error!(error = %e, "failed to encode metrics");
        }
        buf
    }
}

// 5ms .. ~10s
fn http_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
