//! # Repository - Persistence Seam for Reviews and Projects
//!
//! [`ReviewRepository`] is the raw persistence contract the record stores build
//! on: per-entity insert/read/update/list with the equality and ordering filters
//! the workflow needs. Two backends implement it:
//!
//! - [`crate::db::Database`] - Supabase PostgreSQL via `sqlx`
//! - [`MemoryRepository`] - process-local maps, used by tests and offline runs
//!
//! Score derivation and error reporting live in [`crate::review`]. The one
//! rule backends enforce themselves is that a review only leaves `pending`
//! once, and only with its projects fully scored when completing, because
//! that check must be atomic with the write.

mod memory;

pub use memory::MemoryRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::review::{Project, Review, ReviewStatus, ScoreUpdate};

/// Outcome of [`ReviewRepository::transition_review`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Missing,
    /// The review had already left `pending`; nothing was written.
    NotPending(ReviewStatus),
    /// Completion refused; nothing was written.
    Unscored { unscored: usize, total: usize },
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: &Review) -> Result<()>;

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>>;

    /// Reviews ordered by `created_at` descending, optionally filtered by status.
    async fn list_reviews(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>>;

    /// Move a `pending` review to `status`, setting error and `updated_at`.
    ///
    /// The status check, the completion precondition (at least one project,
    /// none without a human score) and the write happen as one step: no other
    /// transition or project insert for the same review can interleave.
    async fn transition_review(
        &self,
        id: Uuid,
        status: ReviewStatus,
        error: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<Transition>;

    /// Insert a project into a `pending` review. A missing review is a
    /// persistence error; a review that has left `pending` is
    /// [`ReviewError::ReviewClosed`](crate::ReviewError::ReviewClosed).
    async fn insert_project(&self, project: &Project) -> Result<()>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>>;

    /// Projects of one review ordered by `created_at` ascending.
    async fn list_projects(&self, review_id: Uuid) -> Result<Vec<Project>>;

    /// Single-row score write. Returns the updated project, or `None` if absent.
    async fn record_score(&self, project_id: Uuid, update: &ScoreUpdate)
        -> Result<Option<Project>>;

    async fn health_check(&self) -> Result<()>;
}
