//! Project row operations.
//!
//! The `analysis` column is JSONB holding the backend's structured result
//! verbatim. It is decoded into [`Analysis`] on every read so malformed rows
//! surface as persistence errors instead of silently scoring against zero.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::reviews::parse_status;
use super::Database;
use crate::error::{Result, ReviewError};
use crate::review::{Analysis, Project, ScoreUpdate};

const PROJECT_COLUMNS: &str = "id, review_id, project_name, project_description, \
     project_github_url, project_owner_github_url, project_url, analysis, \
     human_score, final_score, scored_by, scored_at, error, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub review_id: Uuid,
    pub project_name: String,
    pub project_description: String,
    pub project_github_url: String,
    pub project_owner_github_url: String,
    pub project_url: String,
    pub analysis: serde_json::Value,
    pub human_score: Option<i32>,
    pub final_score: Option<i32>,
    pub scored_by: Option<String>,
    pub scored_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = ReviewError;

    fn try_from(row: ProjectRow) -> Result<Self> {
        let analysis: Analysis = serde_json::from_value(row.analysis)?;
        Ok(Project {
            id: row.id,
            review_id: row.review_id,
            project_name: row.project_name,
            project_description: row.project_description,
            project_github_url: row.project_github_url,
            project_owner_github_url: row.project_owner_github_url,
            project_url: row.project_url,
            analysis,
            human_score: row.human_score,
            final_score: row.final_score,
            scored_by: row.scored_by,
            scored_at: row.scored_at,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Database {
    /// Insert only while the parent review is `pending`, holding a share lock
    /// on it so a concurrent transition waits for this insert.
    pub(super) async fn insert_project_row(&self, project: &Project) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO projects (id, review_id, project_name, project_description,
                                   project_github_url, project_owner_github_url, project_url,
                                   analysis, created_at, updated_at)
             SELECT $1, r.id, $3, $4, $5, $6, $7, $8::jsonb, $9, $10
             FROM reviews r
             WHERE r.id = $2 AND r.status = 'pending'
             FOR SHARE",
        )
        .bind(project.id)
        .bind(project.review_id)
        .bind(&project.project_name)
        .bind(&project.project_description)
        .bind(&project.project_github_url)
        .bind(&project.project_owner_github_url)
        .bind(&project.project_url)
        .bind(Json(&project.analysis))
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        let status: Option<String> = sqlx::query_scalar("SELECT status FROM reviews WHERE id = $1")
            .bind(project.review_id)
            .fetch_optional(&self.pool)
            .await?;
        match status {
            Some(s) => Err(ReviewError::ReviewClosed {
                review_id: project.review_id,
                status: parse_status(project.review_id, &s)?,
            }),
            None => Err(ReviewError::Persistence(format!(
                "project {} references missing review {}",
                project.id, project.review_id
            ))),
        }
    }

    pub(super) async fn get_project_row(&self, id: Uuid) -> Result<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Project::try_from).transpose()
    }

    /// Projects of one review, oldest first.
    pub(super) async fn get_project_rows(&self, review_id: Uuid) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE review_id = $1 ORDER BY created_at ASC, id ASC",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(review_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Project::try_from).collect()
    }

    /// Write human score, final score and scorer in one statement.
    pub(super) async fn update_project_score_row(
        &self,
        project_id: Uuid,
        update: &ScoreUpdate,
    ) -> Result<Option<Project>> {
        let sql = format!(
            "UPDATE projects
             SET human_score = $2, final_score = $3, scored_by = $4, scored_at = $5,
                 updated_at = $5
             WHERE id = $1
             RETURNING {}",
            PROJECT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(project_id)
            .bind(update.human_score)
            .bind(update.final_score)
            .bind(&update.scored_by)
            .bind(update.scored_at)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Project::try_from).transpose()
    }
}
