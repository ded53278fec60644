//! # reviewdesk - Project Review Workflow
//!
//! Reviewers upload a spreadsheet of candidate projects; an external analysis
//! agent scores each project's code quality and Celo integration; reviewers
//! then add a human score per project, and the final score is the rounded mean
//! of both. A review is submitted once every project is scored.
//!
//! | Module | Role |
//! |--------|------|
//! | [`score`] | Final-score combiner and score bounds |
//! | [`review`] | Records, stores, lifecycle controller, session |
//! | [`analysis`] | Analysis backend boundary and the agent subprocess |
//! | [`repository`] | Persistence trait and in-memory backend |
//! | [`db`] | Supabase PostgreSQL backend |
//! | [`dashboard`] | Axum JSON API and health probes |
//! | [`prom_metrics`] | Prometheus registry |
//! | [`config`] | Runtime configuration |
//! | [`error`] | `ReviewError` taxonomy |

pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod prom_metrics;
pub mod repository;
pub mod review;
pub mod score;

pub use error::{Result, ReviewError};
