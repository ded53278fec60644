//! # Database - PostgreSQL Storage Layer
//!
//! Persists reviews and their projects via `sqlx::PgPool` connecting to
//! Supabase PostgreSQL.
//!
//! ## Schema
//!
//! - `reviews`: title, status (`pending | completed | failed`), error, timestamps
//! - `projects`: review_id FK, project metadata, `analysis` JSONB, human/final
//!   score, scorer, timestamps
//!
//! See `supabase/migrations/` for the DDL.
//!
//! ## Module Structure
//!
//! - [`reviews`] - review rows: insert, lookup, list, status update
//! - [`projects`] - project rows: insert, lookup, list by review, score write
//!
//! [`Database`] implements [`ReviewRepository`] by delegating to those
//! submodules, so the workflow layer never sees SQL.

mod projects;
mod reviews;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::error::Result as ReviewResult;
use crate::repository::{ReviewRepository, Transition};
use crate::review::{Project, Review, ReviewStatus, ScoreUpdate};

/// Connection pool shared by the HTTP server and CLI subcommands.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    ///
    /// Manually parses the URL to preserve the full username - sqlx's built-in
    /// parser strips the ".project-ref" suffix that Supabase pooler requires.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let url = url::Url::parse(database_url)?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username)
            .statement_cache_capacity(0);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReviewRepository for Database {
    async fn insert_review(&self, review: &Review) -> ReviewResult<()> {
        self.insert_review_row(review).await
    }

    async fn find_review(&self, id: Uuid) -> ReviewResult<Option<Review>> {
        self.get_review_row(id).await
    }

    async fn list_reviews(&self, status: Option<ReviewStatus>) -> ReviewResult<Vec<Review>> {
        self.get_review_rows(status).await
    }

    async fn transition_review(
        &self,
        id: Uuid,
        status: ReviewStatus,
        error: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> ReviewResult<Transition> {
        self.transition_review_row(id, status, error, updated_at)
            .await
    }

    async fn insert_project(&self, project: &Project) -> ReviewResult<()> {
        self.insert_project_row(project).await
    }

    async fn find_project(&self, id: Uuid) -> ReviewResult<Option<Project>> {
        self.get_project_row(id).await
    }

    async fn list_projects(&self, review_id: Uuid) -> ReviewResult<Vec<Project>> {
        self.get_project_rows(review_id).await
    }

    async fn record_score(
        &self,
        project_id: Uuid,
        update: &ScoreUpdate,
    ) -> ReviewResult<Option<Project>> {
        self.update_project_score_row(project_id, update).await
    }

    /// Execute `SELECT 1`; backs the `/readyz` probe.
    async fn health_check(&self) -> ReviewResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
