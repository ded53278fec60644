//! Review row operations.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Database;
use crate::error::{Result, ReviewError};
use crate::repository::Transition;
use crate::review::{Review, ReviewStatus};

const REVIEW_COLUMNS: &str = "id, title, status, error, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(super) fn parse_status(id: Uuid, status: &str) -> Result<ReviewStatus> {
    status.parse::<ReviewStatus>().map_err(|_| {
        ReviewError::Persistence(format!("review {} has unknown status '{}'", id, status))
    })
}

impl TryFrom<ReviewRow> for Review {
    type Error = ReviewError;

    fn try_from(row: ReviewRow) -> Result<Self> {
        let status = parse_status(row.id, &row.status)?;
        Ok(Review {
            id: row.id,
            title: row.title,
            status,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Database {
    pub(super) async fn insert_review_row(&self, review: &Review) -> Result<()> {
        sqlx::query(
            "INSERT INTO reviews (id, title, status, error, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(review.id)
        .bind(&review.title)
        .bind(review.status.as_str())
        .bind(&review.error)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(super) async fn get_review_row(&self, id: Uuid) -> Result<Option<Review>> {
        let sql = format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS);
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Review::try_from).transpose()
    }

    /// Newest first. `status = None` lists every review.
    pub(super) async fn get_review_rows(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC",
            REVIEW_COLUMNS
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    /// Leave `pending` inside one transaction.
    ///
    /// `FOR UPDATE` on the review row serialises concurrent transitions, and
    /// project inserts hold `FOR SHARE` on the same row, so the completion
    /// count sees every project that will ever belong to the review.
    pub(super) async fn transition_review_row(
        &self,
        id: Uuid,
        status: ReviewStatus,
        error: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<Transition> {
        let mut tx = self.pool.begin().await?;
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM reviews WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = match current {
            Some(s) => parse_status(id, &s)?,
            None => return Ok(Transition::Missing),
        };
        if current != ReviewStatus::Pending {
            return Ok(Transition::NotPending(current));
        }

        if status == ReviewStatus::Completed {
            let (total, unscored): (i64, i64) = sqlx::query_as(
                "SELECT COUNT(*), COUNT(*) FILTER (WHERE human_score IS NULL)
                 FROM projects WHERE review_id = $1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if total == 0 || unscored > 0 {
                return Ok(Transition::Unscored {
                    unscored: unscored as usize,
                    total: total as usize,
                });
            }
        }

        sqlx::query(
            "UPDATE reviews SET status = $2, error = $3, updated_at = $4
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(error)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Transition::Applied)
    }
}
