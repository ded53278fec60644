//! Review lifecycle: start (create + analyse + ingest), score, submit.
//!
//! ```text
//!            start_review                    submit (all projects scored)
//!   ──────────▶ pending ───────────────────────────────────▶ completed
//!                  │
//!                  │ analysis or ingestion error
//!                  ▼
//!               failed
//! ```
//!
//! Ingestion is a bounded fan-out: at most `ingest_concurrency` project inserts
//! are in flight. The first failed insert stops further scheduling, in-flight
//! inserts are awaited, nothing is rolled back, and the review is marked
//! `failed` with the first error.

use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::project_store::ProjectStore;
use super::review_store::ReviewStore;
use super::session::ReviewSession;
use super::types::{Project, ProjectDescriptor, Review, ReviewStatus, ReviewWithProjects};
use crate::analysis::Analyzer;
use crate::error::{Result, ReviewError};
use crate::repository::ReviewRepository;

pub const DEFAULT_INGEST_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub struct ReviewController {
    reviews: ReviewStore,
    projects: ProjectStore,
    analyzer: Arc<dyn Analyzer>,
    ingest_concurrency: usize,
}

impl ReviewController {
    pub fn new(repo: Arc<dyn ReviewRepository>, analyzer: Arc<dyn Analyzer>) -> Self {
        ReviewController {
            reviews: ReviewStore::new(repo.clone()),
            projects: ProjectStore::new(repo),
            analyzer,
            ingest_concurrency: DEFAULT_INGEST_CONCURRENCY,
        }
    }

    pub fn with_ingest_concurrency(mut self, limit: usize) -> Self {
        self.ingest_concurrency = limit.max(1);
        self
    }

    pub fn reviews(&self) -> &ReviewStore {
        &self.reviews
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    /// Create a review, run the analysis on `artifact`, and ingest the results.
    ///
    /// On success the review stays `pending` awaiting human scores and becomes
    /// the session's current review. Any error
    /// after the review row exists marks it `failed` and is returned as
    /// [`ReviewError::AnalysisFailed`] or [`ReviewError::IngestionFailed`].
    pub async fn start_review(
        &self,
        session: &mut ReviewSession,
        title: &str,
        artifact: &Path,
    ) -> Result<ReviewWithProjects> {
        let review = self.reviews.create(title).await?;

        let descriptors = match self.analyzer.analyze(&review.title, artifact).await {
            Ok(d) => d,
            Err(e) => {
                let message = e.to_string();
                self.mark_failed(review.id, &message).await;
                return Err(ReviewError::AnalysisFailed {
                    review_id: review.id,
                    message,
                });
            }
        };

        let projects = match self.ingest(&review, descriptors).await {
            Ok(p) => p,
            Err(e) => {
                let message = e.to_string();
                self.mark_failed(review.id, &message).await;
                return Err(ReviewError::IngestionFailed {
                    review_id: review.id,
                    message,
                });
            }
        };

        info!(review_id = %review.id, projects = projects.len(), "review ready for scoring");
        session.begin(review.id);
        self.reviews.get(review.id).await
    }

    /// Persist analysed projects with bounded concurrency, best effort.
    async fn ingest(
        &self,
        review: &Review,
        descriptors: Vec<ProjectDescriptor>,
    ) -> Result<Vec<Project>> {
        for d in &descriptors {
            d.validate()?;
        }

        let mut in_flight: JoinSet<Result<Project>> = JoinSet::new();
        let mut inserted = Vec::with_capacity(descriptors.len());
        let mut first_error: Option<ReviewError> = None;

        for descriptor in descriptors {
            while in_flight.len() >= self.ingest_concurrency {
                collect_one(&mut in_flight, &mut inserted, &mut first_error).await;
            }
            if first_error.is_some() {
                break;
            }
            let store = self.projects.clone();
            let review_id = review.id;
            in_flight.spawn(async move { store.insert(review_id, descriptor).await });
        }
        while !in_flight.is_empty() {
            collect_one(&mut in_flight, &mut inserted, &mut first_error).await;
        }

        match first_error {
            Some(e) => {
                warn!(
                    review_id = %review.id,
                    inserted = inserted.len(),
                    error = %e,
                    "ingestion aborted; inserted projects are kept"
                );
                Err(e)
            }
            None => Ok(inserted),
        }
    }

    async fn mark_failed(&self, review_id: Uuid, message: &str) {
        if let Err(e) = self
            .reviews
            .set_status(review_id, ReviewStatus::Failed, Some(message))
            .await
        {
            error!(review_id = %review_id, error = %e, "failed to mark review as failed");
        }
    }

    /// Record a human score. Only projects of `pending` reviews can be scored.
    pub async fn score_project(
        &self,
        project_id: Uuid,
        human_score: i32,
        scored_by: Option<&str>,
    ) -> Result<Project> {
        let project = self.projects.get(project_id).await?;
        let review = self.reviews.find(project.review_id).await?;
        if review.status != ReviewStatus::Pending {
            return Err(ReviewError::ReviewClosed {
                review_id: review.id,
                status: review.status,
            });
        }
        self.projects
            .update_human_score(project_id, human_score, scored_by)
            .await
    }

    /// Complete a review once every project carries a human score.
    pub async fn submit(
        &self,
        session: &mut ReviewSession,
        review_id: Uuid,
    ) -> Result<ReviewWithProjects> {
        self.reviews
            .set_status(review_id, ReviewStatus::Completed, None)
            .await?;
        session.clear_if(review_id);
        self.reviews.get(review_id).await
    }

    pub async fn list_completed(&self) -> Result<Vec<ReviewWithProjects>> {
        self.reviews.list_completed().await
    }
}

async fn collect_one(
    in_flight: &mut JoinSet<Result<Project>>,
    inserted: &mut Vec<Project>,
    first_error: &mut Option<ReviewError>,
) {
    let outcome = match in_flight.join_next().await {
        Some(Ok(result)) => result,
        Some(Err(join_err)) => Err(ReviewError::Persistence(format!(
            "project insert task failed: {}",
            join_err
        ))),
        None => return,
    };
    match outcome {
        Ok(project) => inserted.push(project),
        Err(e) => {
            if first_error.is_none() {
                *first_error = Some(e);
            }
        }
    }
}
