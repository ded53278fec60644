//! # Main - CLI Entry Point
//!
//! Routes CLI subcommands to the review workflow and the HTTP server.
//!
//! ## Subcommands
//!
//! - `serve`: run the JSON API (`/api/review/*`, `/api/reviews*`, probes).
//! - `start`: analyse a spreadsheet and ingest its projects as a new review.
//! - `score`: record a human score for one project.
//! - `submit`: complete a review once every project is scored.
//! - `list` / `show`: inspect stored reviews.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: Supabase PostgreSQL connection.
//! - `--agent-dir` / `REVIEWDESK_AGENT_DIR`: analysis agent location.
//! - `--ingest-concurrency`: max project inserts in flight per review.
//! - `--analysis-timeout-secs`: kill the agent after this long (0 = never).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use reviewdesk::config::{ReviewConfig, DEFAULT_AGENT_DIR, DEFAULT_UPLOAD_DIR};
use reviewdesk::review::DEFAULT_INGEST_CONCURRENCY;

#[derive(Parser)]
#[command(
    name = "reviewdesk",
    about = "Review AI-analysed projects, record human scores, and finalise reviews"
)]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory containing the analysis agent (run.py, venv/, reports/)
    #[arg(long, env = "REVIEWDESK_AGENT_DIR", default_value = DEFAULT_AGENT_DIR)]
    agent_dir: PathBuf,

    /// Maximum number of project inserts in flight while ingesting a review
    #[arg(long, env = "REVIEWDESK_INGEST_CONCURRENCY", default_value_t = DEFAULT_INGEST_CONCURRENCY)]
    ingest_concurrency: usize,

    /// Abort an analysis run after this many seconds (0 = no limit)
    #[arg(long, env = "REVIEWDESK_ANALYSIS_TIMEOUT_SECS", default_value_t = 0)]
    analysis_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the review API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 7001)]
        port: u16,
        /// Directory where uploaded spreadsheets are stored
        #[arg(long, env = "REVIEWDESK_UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
        upload_dir: PathBuf,
    },
    /// Start a review: analyse a spreadsheet and ingest its projects
    Start {
        /// Review title
        #[arg(long)]
        title: String,
        /// Spreadsheet to analyse
        #[arg(long)]
        file: PathBuf,
    },
    /// Record a human score (1-100) for a project
    Score {
        #[arg(long)]
        project_id: Uuid,
        #[arg(long)]
        score: i32,
        /// Reviewer identity stored with the score
        #[arg(long)]
        scored_by: Option<String>,
    },
    /// Submit a review once every project is scored
    Submit {
        #[arg(long)]
        review_id: Uuid,
    },
    /// List reviews, newest first
    List {
        /// Only completed reviews, with their projects
        #[arg(long)]
        completed: bool,
    },
    /// Show a review and its projects
    Show {
        /// Review ID
        review_id: Uuid,
    },
}

impl Cli {
    fn config(&self) -> ReviewConfig {
        let upload_dir = match &self.command {
            Commands::Serve { upload_dir, .. } => upload_dir.clone(),
            _ => PathBuf::from(DEFAULT_UPLOAD_DIR),
        };
        ReviewConfig {
            database_url: self.database_url.clone(),
            agent_dir: self.agent_dir.clone(),
            ingest_concurrency: self.ingest_concurrency.max(1),
            analysis_timeout: None,
            upload_dir,
        }
        .with_analysis_timeout_secs(Some(self.analysis_timeout_secs))
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize structured logging: LOG_FORMAT=json for log shipping, human-readable otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let config = cli.config();
    let rt = tokio::runtime::Runtime::new()?;

    match &cli.command {
        Commands::Serve { port, .. } => rt.block_on(reviewdesk::dashboard::run(*port, &config)),
        Commands::Start { title, file } => cli::run_start(&rt, &config, title, file),
        Commands::Score {
            project_id,
            score,
            scored_by,
        } => cli::run_score(&rt, &config, *project_id, *score, scored_by.as_deref()),
        Commands::Submit { review_id } => cli::run_submit(&rt, &config, *review_id),
        Commands::List { completed } => cli::run_list(&rt, &config, *completed),
        Commands::Show { review_id } => cli::run_show(&rt, &config, *review_id),
    }
}
