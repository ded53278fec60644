//! Review record store: creation, lookup, listing, and status transitions.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::types::{Review, ReviewStatus, ReviewWithProjects};
use crate::error::{Result, ReviewError};
use crate::repository::{ReviewRepository, Transition};

#[derive(Clone)]
pub struct ReviewStore {
    repo: Arc<dyn ReviewRepository>,
}

impl ReviewStore {
    pub fn new(repo: Arc<dyn ReviewRepository>) -> Self {
        ReviewStore { repo }
    }

    /// Create a review in `pending`.
    pub async fn create(&self, title: &str) -> Result<Review> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ReviewError::validation("title is required"));
        }
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            title: title.to_string(),
            status: ReviewStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_review(&review).await?;
        info!(review_id = %review.id, title = %review.title, "review created");
        Ok(review)
    }

    pub async fn find(&self, review_id: Uuid) -> Result<Review> {
        self.repo
            .find_review(review_id)
            .await?
            .ok_or_else(|| ReviewError::review_not_found(review_id))
    }

    /// A review with its projects, oldest project first.
    pub async fn get(&self, review_id: Uuid) -> Result<ReviewWithProjects> {
        let review = self.find(review_id).await?;
        let projects = self.repo.list_projects(review_id).await?;
        Ok(ReviewWithProjects { review, projects })
    }

    /// All reviews, newest first.
    pub async fn list_all(&self) -> Result<Vec<Review>> {
        self.repo.list_reviews(None).await
    }

    /// Completed reviews, newest first, each with its projects.
    pub async fn list_completed(&self) -> Result<Vec<ReviewWithProjects>> {
        let reviews = self.repo.list_reviews(Some(ReviewStatus::Completed)).await?;
        let mut out = Vec::with_capacity(reviews.len());
        for review in reviews {
            let projects = self.repo.list_projects(review.id).await?;
            out.push(ReviewWithProjects { review, projects });
        }
        Ok(out)
    }

    /// Move a review along `pending -> completed | failed`.
    ///
    /// Completion requires at least one project and every project scored.
    /// `error` is stored only on the transition to `failed`. The repository
    /// applies the check and the write atomically, so of two concurrent
    /// transitions exactly one succeeds.
    pub async fn set_status(
        &self,
        review_id: Uuid,
        status: ReviewStatus,
        error: Option<&str>,
    ) -> Result<()> {
        if !ReviewStatus::Pending.can_transition_to(status) {
            let current = self.find(review_id).await?;
            return Err(ReviewError::InvalidTransition {
                review_id,
                from: current.status,
                to: status,
            });
        }

        let error = if status == ReviewStatus::Failed {
            error
        } else {
            None
        };
        match self
            .repo
            .transition_review(review_id, status, error, Utc::now())
            .await?
        {
            Transition::Applied => {
                info!(review_id = %review_id, from = %ReviewStatus::Pending, to = %status, "review status changed");
                Ok(())
            }
            Transition::Missing => Err(ReviewError::review_not_found(review_id)),
            Transition::NotPending(from) => Err(ReviewError::InvalidTransition {
                review_id,
                from,
                to: status,
            }),
            Transition::Unscored { total: 0, .. } => Err(ReviewError::validation(format!(
                "review {} has no projects to submit",
                review_id
            ))),
            Transition::Unscored { unscored, total } => Err(ReviewError::validation(format!(
                "{} of {} projects in review {} have no human score",
                unscored, total, review_id
            ))),
        }
    }
}
