//! # Analysis - External Scoring Backend Boundary
//!
//! An [`Analyzer`] takes an uploaded spreadsheet and returns one
//! [`ProjectDescriptor`] per candidate project. The call is a single opaque unit
//! of work: no progress signal, no partial results.
//!
//! [`AgentAnalyzer`] drives the Python analysis agent as a subprocess:
//!
//! ```text
//! <agent_dir>/venv/bin/python run.py --excel <artifact>     (cwd = agent_dir)
//!     ↓ exit 0
//! <agent_dir>/reports/*.json   - newest (lexicographically greatest) name wins
//!     ↓ parse
//! Vec<ProjectDescriptor>
//! ```
//!
//! A non-zero exit is reported with the captured stderr. There is no timeout
//! unless one is configured.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{Result, ReviewError};
use crate::review::ProjectDescriptor;

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, title: &str, artifact: &Path) -> Result<Vec<ProjectDescriptor>>;
}

pub struct AgentAnalyzer {
    agent_dir: PathBuf,
    timeout: Option<Duration>,
}

impl AgentAnalyzer {
    pub fn new(agent_dir: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        AgentAnalyzer {
            agent_dir: agent_dir.into(),
            timeout,
        }
    }

    /// Interpreter inside the agent's virtualenv.
    pub fn python_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.agent_dir.join("venv").join("Scripts").join("python.exe")
        } else {
            self.agent_dir.join("venv").join("bin").join("python")
        }
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.agent_dir.join("reports")
    }

    async fn run_agent(&self, artifact: &Path) -> Result<()> {
        let mut cmd = Command::new(self.python_path());
        cmd.arg("run.py")
            .arg("--excel")
            .arg(artifact)
            .current_dir(&self.agent_dir)
            .env("PYTHONPATH", &self.agent_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| ReviewError::Analysis(format!("failed to spawn analysis agent: {}", e)))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    ReviewError::Analysis(format!(
                        "analysis agent timed out after {}s",
                        limit.as_secs()
                    ))
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| ReviewError::Analysis(format!("failed to wait for analysis agent: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            warn!(code = %code, "analysis agent failed");
            return Err(ReviewError::Analysis(format!(
                "Agent process exited with code {}\nError: {}",
                code,
                stderr.trim_end()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Analyzer for AgentAnalyzer {
    async fn analyze(&self, title: &str, artifact: &Path) -> Result<Vec<ProjectDescriptor>> {
        let start = Instant::now();
        info!(title = %title, artifact = %artifact.display(), "running analysis agent");

        self.run_agent(artifact).await?;
        let projects = load_latest_report(&self.reports_dir()).await?;

        info!(
            title = %title,
            projects = projects.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "analysis complete"
        );
        Ok(projects)
    }
}

/// Parse the newest `*.json` report in `dir`.
///
/// Report names are timestamped by the agent, so the greatest file name is the
/// most recent run.
pub async fn load_latest_report(dir: &Path) -> Result<Vec<ProjectDescriptor>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        ReviewError::Analysis(format!(
            "cannot read report directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut latest: Option<String> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ReviewError::Analysis(format!("cannot list reports: {}", e)))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") && latest.as_ref().map_or(true, |l| name > *l) {
            latest = Some(name);
        }
    }

    let name = latest.ok_or_else(|| ReviewError::Analysis("No report file was generated".into()))?;
    let path = dir.join(&name);
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        ReviewError::Analysis(format!("cannot read report '{}': {}", path.display(), e))
    })?;
    parse_report(&content)
        .map_err(|e| ReviewError::Analysis(format!("malformed report '{}': {}", name, e)))
}

pub fn parse_report(content: &str) -> std::result::Result<Vec<ProjectDescriptor>, serde_json::Error> {
    serde_json::from_str(content)
}
