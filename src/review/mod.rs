//! # Review - Workflow Core
//!
//! A review is one evaluation session over a batch of projects. It is created
//! `pending`, filled by the analysis backend, scored by a human reviewer one
//! project at a time, and finally submitted as `completed`. Analysis or
//! ingestion errors end it in `failed`.
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Review/project records, status machine, analysis descriptor |
//! | [`review_store`] | Review creation, listing, guarded status changes |
//! | [`project_store`] | Project ingestion and human scoring |
//! | [`lifecycle`] | [`ReviewController`]: start, score, submit |
//! | [`session`] | Caller-owned "current review" handle |

pub mod lifecycle;
pub mod project_store;
pub mod review_store;
pub mod session;
pub mod types;


pub use lifecycle::{ReviewController, DEFAULT_INGEST_CONCURRENCY};
pub use project_store::ProjectStore;
pub use review_store::ReviewStore;
pub use session::ReviewSession;
pub use types::{
    Analysis, CeloIntegration, CodeQuality, Project, ProjectDescriptor, Review, ReviewStatus,
    ReviewWithProjects, ScoreUpdate,
};
