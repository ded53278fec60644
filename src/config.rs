//! Runtime configuration collected from CLI flags, environment, and `.env`.
//!
//! `main` parses flags with clap (every flag has an env fallback) after
//! `dotenvy` has loaded `.env`, then hands a [`ReviewConfig`] to the command
//! being run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::{AgentAnalyzer, Analyzer};
use crate::repository::ReviewRepository;
use crate::review::{ReviewController, DEFAULT_INGEST_CONCURRENCY};

pub const DEFAULT_AGENT_DIR: &str = "agent";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    /// Supabase PostgreSQL URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Directory holding the analysis agent (`run.py`, `venv/`, `reports/`).
    pub agent_dir: PathBuf,
    pub ingest_concurrency: usize,
    /// Upper bound on one analysis run. Unbounded when `None`.
    pub analysis_timeout: Option<Duration>,
    /// Where uploaded spreadsheets are written before analysis.
    pub upload_dir: PathBuf,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        ReviewConfig {
            database_url: None,
            agent_dir: PathBuf::from(DEFAULT_AGENT_DIR),
            ingest_concurrency: DEFAULT_INGEST_CONCURRENCY,
            analysis_timeout: None,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

impl ReviewConfig {
    /// `0` means "no timeout", matching the flag's documented default.
    pub fn with_analysis_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.analysis_timeout = secs.filter(|s| *s > 0).map(Duration::from_secs);
        self
    }

    pub fn analyzer(&self) -> AgentAnalyzer {
        AgentAnalyzer::new(&self.agent_dir, self.analysis_timeout)
    }

    /// Wire a controller over `repo` and `analyzer` with the configured fan-out.
    pub fn controller(
        &self,
        repo: Arc<dyn ReviewRepository>,
        analyzer: Arc<dyn Analyzer>,
    ) -> ReviewController {
        ReviewController::new(repo, analyzer).with_ingest_concurrency(self.ingest_concurrency)
    }
}
