//! Project record store: per-review project access and human scoring.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{Project, ProjectDescriptor, ScoreUpdate};
use crate::error::{Result, ReviewError};
use crate::repository::ReviewRepository;
use crate::score;

#[derive(Clone)]
pub struct ProjectStore {
    repo: Arc<dyn ReviewRepository>,
}

impl ProjectStore {
    pub fn new(repo: Arc<dyn ReviewRepository>) -> Self {
        ProjectStore { repo }
    }

    /// Projects of a review, oldest first. An unknown review yields an empty list.
    pub async fn list_by_review(&self, review_id: Uuid) -> Result<Vec<Project>> {
        self.repo.list_projects(review_id).await
    }

    pub async fn get(&self, project_id: Uuid) -> Result<Project> {
        self.repo
            .find_project(project_id)
            .await?
            .ok_or_else(|| ReviewError::project_not_found(project_id))
    }

    /// Persist one analysed project under `review_id`, unscored.
    pub async fn insert(&self, review_id: Uuid, descriptor: ProjectDescriptor) -> Result<Project> {
        descriptor.validate()?;
        let project = Project::from_descriptor(review_id, descriptor, Utc::now());
        self.repo.insert_project(&project).await?;
        debug!(review_id = %review_id, project_id = %project.id, name = %project.project_name, "project ingested");
        Ok(project)
    }

    /// Record a reviewer's score and the derived final score.
    ///
    /// The AI score is re-read from the stored analysis on every call, so the
    /// final score always reflects what was ingested. Last writer wins.
    pub async fn update_human_score(
        &self,
        project_id: Uuid,
        human_score: i32,
        scored_by: Option<&str>,
    ) -> Result<Project> {
        score::validate_human_score(human_score)?;

        let existing = self.get(project_id).await?;
        let final_score = score::combine(existing.analysis.overall_score(), human_score)?;

        let update = ScoreUpdate {
            human_score,
            final_score,
            scored_by: scored_by.map(str::to_string),
            scored_at: Utc::now(),
        };
        let project = self
            .repo
            .record_score(project_id, &update)
            .await?
            .ok_or_else(|| ReviewError::project_not_found(project_id))?;

        info!(
            project_id = %project_id,
            review_id = %project.review_id,
            human_score,
            final_score,
            "project scored"
        );
        Ok(project)
    }
}
