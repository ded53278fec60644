//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Each function
//! connects to the database, runs one workflow operation on the shared Tokio
//! runtime, and prints a human-readable summary to stderr.

use anyhow::Result;
use reviewdesk::config::ReviewConfig;
use reviewdesk::db;
use reviewdesk::review::{Project, ReviewController, ReviewSession, ReviewWithProjects};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;
use uuid::Uuid;

fn connect(rt: &Runtime, config: &ReviewConfig) -> Result<ReviewController> {
    let database_url = config.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })?;
    let database = rt.block_on(db::Database::connect(database_url))?;
    Ok(config.controller(Arc::new(database), Arc::new(config.analyzer())))
}

fn score_cell(score: Option<i32>) -> String {
    score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        eprintln!("  (no projects)");
        return;
    }
    eprintln!(
        "  {:<36} {:<30} {:>6} {:>6} {:>6}",
        "PROJECT ID", "NAME", "AI", "HUMAN", "FINAL"
    );
    eprintln!("  {}", "-".repeat(88));
    for p in projects {
        eprintln!(
            "  {:<36} {:<30} {:>6.1} {:>6} {:>6}",
            p.id,
            truncate(&p.project_name, 30),
            p.analysis.overall_score(),
            score_cell(p.human_score),
            score_cell(p.final_score)
        );
    }
}

fn print_review(r: &ReviewWithProjects) {
    eprintln!("Review: {} ({})", r.review.title, r.review.id);
    eprintln!("  Status:   {}", r.review.status);
    eprintln!("  Created:  {}", r.review.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(ref err) = r.review.error {
        eprintln!("  Error:    {}", err);
    }
    eprintln!(
        "  Projects: {} ({} unscored)",
        r.projects.len(),
        r.unscored_count()
    );
    print_projects(&r.projects);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}

pub fn run_start(rt: &Runtime, config: &ReviewConfig, title: &str, file: &Path) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("spreadsheet '{}' does not exist", file.display());
    }
    let controller = connect(rt, config)?;
    let mut session = ReviewSession::new();
    let review = rt.block_on(controller.start_review(&mut session, title, file))?;
    info!(review_id = %review.review.id, projects = review.projects.len(), "review started");
    print_review(&review);
    eprintln!(
        "\nScore with: reviewdesk score --project-id <ID> --score <1-100>"
    );
    Ok(())
}

pub fn run_score(
    rt: &Runtime,
    config: &ReviewConfig,
    project_id: Uuid,
    score: i32,
    scored_by: Option<&str>,
) -> Result<()> {
    let controller = connect(rt, config)?;
    let project = rt.block_on(controller.score_project(project_id, score, scored_by))?;
    eprintln!(
        "Scored '{}': human {} / AI {:.1} -> final {}",
        project.project_name,
        score,
        project.analysis.overall_score(),
        score_cell(project.final_score)
    );
    Ok(())
}

pub fn run_submit(rt: &Runtime, config: &ReviewConfig, review_id: Uuid) -> Result<()> {
    let controller = connect(rt, config)?;
    let mut session = ReviewSession::new();
    let review = rt.block_on(controller.submit(&mut session, review_id))?;
    eprintln!("Review '{}' submitted", review.review.title);
    print_projects(&review.projects);
    Ok(())
}

pub fn run_list(rt: &Runtime, config: &ReviewConfig, completed: bool) -> Result<()> {
    let controller = connect(rt, config)?;
    if completed {
        let reviews = rt.block_on(controller.list_completed())?;
        if reviews.is_empty() {
            eprintln!("No completed reviews");
        }
        for r in &reviews {
            print_review(r);
            eprintln!();
        }
        return Ok(());
    }

    let reviews = rt.block_on(controller.reviews().list_all())?;
    if reviews.is_empty() {
        eprintln!("No reviews found");
        return Ok(());
    }
    eprintln!("{:<36} {:<10} {:<20} {}", "ID", "STATUS", "CREATED", "TITLE");
    eprintln!("{}", "-".repeat(90));
    for r in &reviews {
        eprintln!(
            "{:<36} {:<10} {:<20} {}",
            r.id,
            r.status,
            r.created_at.format("%Y-%m-%d %H:%M"),
            r.title
        );
    }
    Ok(())
}

pub fn run_show(rt: &Runtime, config: &ReviewConfig, review_id: Uuid) -> Result<()> {
    let controller = connect(rt, config)?;
    let review = rt.block_on(controller.reviews().get(review_id))?;
    print_review(&review);
    Ok(())
}
