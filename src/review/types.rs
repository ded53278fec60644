//! Review and project records.
//!
//! These are the domain shapes shared by every repository backend and by the
//! HTTP layer. Field names serialize in snake_case, matching the `reviews` and
//! `projects` table columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ReviewError;
use crate::score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Completed,
    Failed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Completed => "completed",
            ReviewStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Completed | ReviewStatus::Failed)
    }

    /// `pending` is the only state with outgoing edges.
    pub fn can_transition_to(&self, next: ReviewStatus) -> bool {
        matches!(
            (self, next),
            (ReviewStatus::Pending, ReviewStatus::Completed)
                | (ReviewStatus::Pending, ReviewStatus::Failed)
        )
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "completed" => Ok(ReviewStatus::Completed),
            "failed" => Ok(ReviewStatus::Failed),
            other => Err(ReviewError::validation(format!(
                "unknown review status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub title: String,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Code-quality block of an analysis. Extra keys from the backend are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeQuality {
    pub overall_score: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeloIntegration {
    pub integrated: bool,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Structured analysis result attached to a project at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub code_quality: CodeQuality,
    pub celo_integration: CeloIntegration,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Analysis {
    pub fn overall_score(&self) -> f64 {
        self.code_quality.overall_score
    }
}

/// One analysed project as returned by the analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    #[serde(default)]
    pub project_github_url: String,
    #[serde(default)]
    pub project_owner_github_url: String,
    #[serde(default)]
    pub project_url: String,
    pub analysis: Analysis,
}

impl ProjectDescriptor {
    /// Reject descriptors that would break the project invariants once stored.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.project_name.trim().is_empty() {
            return Err(ReviewError::validation("project_name is required"));
        }
        score::validate_ai_score(self.analysis.overall_score()).map_err(|e| {
            ReviewError::validation(format!("project '{}': {}", self.project_name, e))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub review_id: Uuid,
    pub project_name: String,
    pub project_description: String,
    pub project_github_url: String,
    pub project_owner_github_url: String,
    pub project_url: String,
    pub analysis: Analysis,
    pub human_score: Option<i32>,
    pub final_score: Option<i32>,
    pub scored_by: Option<String>,
    pub scored_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Build a fresh, unscored project from an analysis descriptor.
    pub fn from_descriptor(review_id: Uuid, d: ProjectDescriptor, now: DateTime<Utc>) -> Self {
        Project {
            id: Uuid::new_v4(),
            review_id,
            project_name: d.project_name,
            project_description: d.project_description,
            project_github_url: d.project_github_url,
            project_owner_github_url: d.project_owner_github_url,
            project_url: d.project_url,
            analysis: d.analysis,
            human_score: None,
            final_score: None,
            scored_by: None,
            scored_at: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.human_score.is_some()
    }
}

/// Fields written by a single score update.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdate {
    pub human_score: i32,
    pub final_score: i32,
    pub scored_by: Option<String>,
    pub scored_at: DateTime<Utc>,
}

/// A review together with its projects, ordered by `created_at` ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewWithProjects {
    #[serde(flatten)]
    pub review: Review,
    pub projects: Vec<Project>,
}

impl ReviewWithProjects {
    pub fn unscored_count(&self) -> usize {
        self.projects.iter().filter(|p| !p.is_scored()).count()
    }
}
