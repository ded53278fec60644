//! In-memory repository backend.
//!
//! Rows live in a single mutex-guarded map per table. Each insert takes a
//! sequence number so rows created within the same clock tick still list in
//! insertion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{ReviewRepository, Transition};
use crate::error::{Result, ReviewError};
use crate::review::{Project, Review, ReviewStatus, ScoreUpdate};

#[derive(Default)]
struct Tables {
    next_seq: u64,
    reviews: HashMap<Uuid, (u64, Review)>,
    projects: HashMap<Uuid, (u64, Project)>,
}

impl Tables {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn review_count(&self) -> usize {
        self.lock().reviews.len()
    }

    pub fn project_count(&self) -> usize {
        self.lock().projects.len()
    }
}

#[async_trait]
impl ReviewRepository for MemoryRepository {
    async fn insert_review(&self, review: &Review) -> Result<()> {
        let mut t = self.lock();
        if t.reviews.contains_key(&review.id) {
            return Err(ReviewError::Persistence(format!(
                "duplicate review id {}",
                review.id
            )));
        }
        let seq = t.seq();
        t.reviews.insert(review.id, (seq, review.clone()));
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.lock().reviews.get(&id).map(|(_, r)| r.clone()))
    }

    async fn list_reviews(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>> {
        let t = self.lock();
        let mut rows: Vec<&(u64, Review)> = t
            .reviews
            .values()
            .filter(|(_, r)| status.map_or(true, |s| r.status == s))
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        Ok(rows.into_iter().map(|(_, r)| r.clone()).collect())
    }

    async fn transition_review(
        &self,
        id: Uuid,
        status: ReviewStatus,
        error: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<Transition> {
        let mut t = self.lock();
        match t.reviews.get(&id) {
            None => return Ok(Transition::Missing),
            Some((_, review)) if review.status != ReviewStatus::Pending => {
                return Ok(Transition::NotPending(review.status));
            }
            Some(_) => {}
        }
        if status == ReviewStatus::Completed {
            let (total, unscored) = t
                .projects
                .values()
                .filter(|(_, p)| p.review_id == id)
                .fold((0, 0), |(total, unscored), (_, p)| {
                    (total + 1, unscored + usize::from(!p.is_scored()))
                });
            if total == 0 || unscored > 0 {
                return Ok(Transition::Unscored { unscored, total });
            }
        }
        if let Some((_, review)) = t.reviews.get_mut(&id) {
            review.status = status;
            review.error = error.map(str::to_string);
            review.updated_at = updated_at;
        }
        Ok(Transition::Applied)
    }

    async fn insert_project(&self, project: &Project) -> Result<()> {
        let mut t = self.lock();
        match t.reviews.get(&project.review_id) {
            None => {
                return Err(ReviewError::Persistence(format!(
                    "project {} references missing review {}",
                    project.id, project.review_id
                )));
            }
            Some((_, review)) if review.status != ReviewStatus::Pending => {
                return Err(ReviewError::ReviewClosed {
                    review_id: review.id,
                    status: review.status,
                });
            }
            Some(_) => {}
        }
        let seq = t.seq();
        t.projects.insert(project.id, (seq, project.clone()));
        Ok(())
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.lock().projects.get(&id).map(|(_, p)| p.clone()))
    }

    async fn list_projects(&self, review_id: Uuid) -> Result<Vec<Project>> {
        let t = self.lock();
        let mut rows: Vec<&(u64, Project)> = t
            .projects
            .values()
            .filter(|(_, p)| p.review_id == review_id)
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| a.created_at.cmp(&b.created_at).then(sa.cmp(sb)));
        Ok(rows.into_iter().map(|(_, p)| p.clone()).collect())
    }

    async fn record_score(
        &self,
        project_id: Uuid,
        update: &ScoreUpdate,
    ) -> Result<Option<Project>> {
        let mut t = self.lock();
        Ok(t.projects.get_mut(&project_id).map(|(_, project)| {
            project.human_score = Some(update.human_score);
            project.final_score = Some(update.final_score);
            project.scored_by = update.scored_by.clone();
            project.scored_at = Some(update.scored_at);
            project.updated_at = update.scored_at;
            project.clone()
        }))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{Analysis, CeloIntegration, CodeQuality, ProjectDescriptor};
    use chrono::Duration;

    fn review(title: &str, created_at: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::new_v4(),
            title: title.to_string(),
            status: ReviewStatus::Pending,
            error: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn project(review_id: Uuid, name: &str, created_at: DateTime<Utc>) -> Project {
        let descriptor = ProjectDescriptor {
            project_name: name.to_string(),
            project_description: String::new(),
            project_github_url: String::new(),
            project_owner_github_url: String::new(),
            project_url: String::new(),
            analysis: Analysis {
                code_quality: CodeQuality {
                    overall_score: 70.0,
                    extra: Default::default(),
                },
                celo_integration: CeloIntegration {
                    integrated: false,
                    evidence: vec![],
                    extra: Default::default(),
                },
                extra: Default::default(),
            },
        };
        Project::from_descriptor(review_id, descriptor, created_at)
    }

    #[tokio::test]
    async fn reviews_list_newest_first() {
        let repo = MemoryRepository::new();
        let t0 = Utc::now();
        let old = review("old", t0);
        let new = review("new", t0 + Duration::seconds(5));
        repo.insert_review(&old).await.unwrap();
        repo.insert_review(&new).await.unwrap();

        let rows = repo.list_reviews(None).await.unwrap();
        assert_eq!(rows[0].title, "new");
        assert_eq!(rows[1].title, "old");
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_insertion_order() {
        let repo = MemoryRepository::new();
        let t0 = Utc::now();
        let r = review("r", t0);
        repo.insert_review(&r).await.unwrap();
        for name in ["a", "b", "c"] {
            repo.insert_project(&project(r.id, name, t0)).await.unwrap();
        }
        let names: Vec<String> = repo
            .list_projects(r.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.project_name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn status_filter_applies() {
        let repo = MemoryRepository::new();
        let r = review("r", Utc::now());
        repo.insert_review(&r).await.unwrap();
        let outcome = repo
            .transition_review(r.id, ReviewStatus::Failed, Some("boom"), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Transition::Applied);
        assert_eq!(
            repo.list_reviews(Some(ReviewStatus::Failed))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(repo
            .list_reviews(Some(ReviewStatus::Pending))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn project_requires_existing_review() {
        let repo = MemoryRepository::new();
        let orphan = project(Uuid::new_v4(), "orphan", Utc::now());
        assert!(repo.insert_project(&orphan).await.is_err());
        assert_eq!(repo.project_count(), 0);
    }

    #[tokio::test]
    async fn transition_only_leaves_pending_once() {
        let repo = MemoryRepository::new();
        let r = review("r", Utc::now());
        repo.insert_review(&r).await.unwrap();
        repo.transition_review(r.id, ReviewStatus::Failed, Some("first"), Utc::now())
            .await
            .unwrap();

        let outcome = repo
            .transition_review(r.id, ReviewStatus::Failed, Some("second"), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Transition::NotPending(ReviewStatus::Failed));
        let stored = repo.find_review(r.id).await.unwrap().unwrap();
        assert_eq!(stored.error.as_deref(), Some("first"));

        let outcome = repo
            .transition_review(Uuid::new_v4(), ReviewStatus::Failed, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Transition::Missing);
    }

    #[tokio::test]
    async fn completion_requires_scored_projects() {
        let repo = MemoryRepository::new();
        let t0 = Utc::now();
        let r = review("r", t0);
        repo.insert_review(&r).await.unwrap();
        let outcome = repo
            .transition_review(r.id, ReviewStatus::Completed, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Transition::Unscored { unscored: 0, total: 0 });

        let a = project(r.id, "a", t0);
        let b = project(r.id, "b", t0);
        repo.insert_project(&a).await.unwrap();
        repo.insert_project(&b).await.unwrap();
        let update = ScoreUpdate {
            human_score: 80,
            final_score: 75,
            scored_by: None,
            scored_at: Utc::now(),
        };
        repo.record_score(a.id, &update).await.unwrap();
        let outcome = repo
            .transition_review(r.id, ReviewStatus::Completed, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Transition::Unscored { unscored: 1, total: 2 });
        assert_eq!(
            repo.find_review(r.id).await.unwrap().unwrap().status,
            ReviewStatus::Pending
        );

        repo.record_score(b.id, &update).await.unwrap();
        let outcome = repo
            .transition_review(r.id, ReviewStatus::Completed, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Transition::Applied);
    }

    #[tokio::test]
    async fn closed_review_accepts_no_projects() {
        let repo = MemoryRepository::new();
        let r = review("r", Utc::now());
        repo.insert_review(&r).await.unwrap();
        repo.transition_review(r.id, ReviewStatus::Failed, Some("boom"), Utc::now())
            .await
            .unwrap();
        let err = repo
            .insert_project(&project(r.id, "late", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::ReviewClosed {
                status: ReviewStatus::Failed,
                ..
            }
        ));
        assert_eq!(repo.project_count(), 0);
    }

    #[tokio::test]
    async fn record_score_on_missing_project_returns_none() {
        let repo = MemoryRepository::new();
        let update = ScoreUpdate {
            human_score: 50,
            final_score: 60,
            scored_by: None,
            scored_at: Utc::now(),
        };
        assert!(repo
            .record_score(Uuid::new_v4(), &update)
            .await
            .unwrap()
            .is_none());
    }
}
