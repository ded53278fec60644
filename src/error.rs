//! Error taxonomy for the review workflow.
//!
//! Every operation in [`crate::review`] returns [`ReviewError`]. The HTTP layer
//! maps each variant onto a status code via [`ReviewError::status_code`]; the
//! CLI just prints the `Display` text.

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::review::ReviewStatus;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Malformed score, missing required field, or unmet precondition.
    #[error("{0}")]
    Validation(String),

    /// Reference to a review or project that does not exist.
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Status change outside `pending -> completed | failed`.
    #[error("cannot move review {review_id} from '{from}' to '{to}'")]
    InvalidTransition {
        review_id: Uuid,
        from: ReviewStatus,
        to: ReviewStatus,
    },

    /// Scores of a `completed` or `failed` review are frozen.
    #[error("review {review_id} is {status}; its scores can no longer change")]
    ReviewClosed {
        review_id: Uuid,
        status: ReviewStatus,
    },

    /// The analysis backend could not be run or returned garbage.
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// Analysis failed after the review row was created; the review is now `failed`.
    #[error("analysis failed for review {review_id}: {message}")]
    AnalysisFailed { review_id: Uuid, message: String },

    /// Persisting analysed projects failed; the review is now `failed`.
    #[error("ingestion failed for review {review_id}: {message}")]
    IngestionFailed { review_id: Uuid, message: String },

    /// Store read/write failure.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ReviewError {
    pub fn validation(message: impl Into<String>) -> Self {
        ReviewError::Validation(message.into())
    }

    pub fn review_not_found(id: Uuid) -> Self {
        ReviewError::NotFound {
            entity: "Review",
            id,
        }
    }

    pub fn project_not_found(id: Uuid) -> Self {
        ReviewError::NotFound {
            entity: "Project",
            id,
        }
    }

    /// The review this error was attributed to, if the failure happened after
    /// the review row existed.
    pub fn review_id(&self) -> Option<Uuid> {
        match self {
            ReviewError::AnalysisFailed { review_id, .. }
            | ReviewError::IngestionFailed { review_id, .. }
            | ReviewError::InvalidTransition { review_id, .. }
            | ReviewError::ReviewClosed { review_id, .. } => Some(*review_id),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
            ReviewError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReviewError::InvalidTransition { .. } | ReviewError::ReviewClosed { .. } => {
                StatusCode::CONFLICT
            }
            ReviewError::Analysis(_)
            | ReviewError::AnalysisFailed { .. }
            | ReviewError::IngestionFailed { .. } => StatusCode::BAD_GATEWAY,
            ReviewError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ReviewError {
    fn from(e: sqlx::Error) -> Self {
        ReviewError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for ReviewError {
    fn from(e: serde_json::Error) -> Self {
        ReviewError::Persistence(format!("malformed stored JSON: {}", e))
    }
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
