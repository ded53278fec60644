//! Property-based tests for score derivation and the scoring invariants.
//!
//! These tests use the `proptest` framework to check that the score combiner
//! and the project store hold their invariants across randomly generated
//! inputs, not just the handful of worked examples in the unit tests.
//!
//! # Prerequisites
//!
//! - No database or network access required; the store tests use the
//!   in-memory repository.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing (default is 256):
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! Each property is named `prop_<function>_<invariant>`.

mod common;

use proptest::prelude::*;
use reviewdesk::repository::MemoryRepository;
use reviewdesk::review::{ReviewController, ReviewSession};
use reviewdesk::score::{self, MAX_HUMAN_SCORE, MIN_HUMAN_SCORE};
use std::path::Path;
use std::sync::Arc;

use common::{descriptor, FakeAnalyzer};

// == Score combiner ============================================================

proptest! {
    /// The final score is the mean rounded to the nearest integer, so it never
    /// strays more than half a point from the exact mean.
    #[test]
    fn prop_combine_within_half_point_of_mean(
        ai in 0.0f64..=100.0,
        human in MIN_HUMAN_SCORE..=MAX_HUMAN_SCORE,
    ) {
        let final_score = score::combine(ai, human).unwrap();
        let mean = (ai + f64::from(human)) / 2.0;
        prop_assert!((f64::from(final_score) - mean).abs() <= 0.5,
            "combine({}, {}) = {} but mean is {}", ai, human, final_score, mean);
    }

    /// Ties round up: an exact .5 mean always goes to the next integer.
    #[test]
    fn prop_combine_ties_round_up(
        ai in 0u32..=100,
        human in MIN_HUMAN_SCORE..=MAX_HUMAN_SCORE,
    ) {
        let sum = ai as i32 + human;
        let final_score = score::combine(f64::from(ai), human).unwrap();
        prop_assert_eq!(final_score, (sum + 1) / 2);
    }

    /// A higher human score never lowers the final score.
    #[test]
    fn prop_combine_monotonic_in_human_score(
        ai in 0.0f64..=100.0,
        human in MIN_HUMAN_SCORE..MAX_HUMAN_SCORE,
    ) {
        let lower = score::combine(ai, human).unwrap();
        let higher = score::combine(ai, human + 1).unwrap();
        prop_assert!(higher >= lower);
    }

    /// The final score stays within the range of its inputs.
    #[test]
    fn prop_combine_bounded_by_inputs(
        ai in 0.0f64..=100.0,
        human in MIN_HUMAN_SCORE..=MAX_HUMAN_SCORE,
    ) {
        let final_score = f64::from(score::combine(ai, human).unwrap());
        let lo = ai.min(f64::from(human)).floor();
        let hi = ai.max(f64::from(human)).ceil();
        prop_assert!(final_score >= lo && final_score <= hi);
    }

    /// Human scores are accepted exactly on [1, 100].
    #[test]
    fn prop_human_score_bounds(human in -1000i32..1000) {
        let accepted = score::validate_human_score(human).is_ok();
        prop_assert_eq!(accepted, (1..=100).contains(&human));
        prop_assert_eq!(score::combine(50.0, human).is_ok(), accepted);
    }

    /// Non-finite AI scores never produce a final score.
    #[test]
    fn prop_combine_rejects_non_finite(human in MIN_HUMAN_SCORE..=MAX_HUMAN_SCORE) {
        for ai in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            prop_assert!(score::combine(ai, human).is_err());
        }
    }
}

// == Project store =============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any sequence of valid and invalid score writes, every project has
    /// a final score iff it has a human score, and the final score matches the
    /// last accepted human score.
    #[test]
    fn prop_final_score_tracks_last_human_score(
        ais in prop::collection::vec(0.0f64..=100.0, 1..5),
        writes in prop::collection::vec((0usize..5, -10i32..120), 0..20),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let descriptors = ais
                .iter()
                .enumerate()
                .map(|(i, ai)| descriptor(&format!("P{}", i), *ai))
                .collect();
            let controller = ReviewController::new(
                Arc::new(MemoryRepository::new()),
                FakeAnalyzer::returning(descriptors),
            );
            let mut session = ReviewSession::new();
            let review = controller
                .start_review(&mut session, "Batch", Path::new("b.xlsx"))
                .await
                .unwrap();

            let mut last: Vec<Option<i32>> = vec![None; review.projects.len()];
            for (idx, human) in &writes {
                let idx = idx % review.projects.len();
                let result = controller
                    .score_project(review.projects[idx].id, *human, None)
                    .await;
                assert_eq!(result.is_ok(), (1..=100).contains(human));
                if result.is_ok() {
                    last[idx] = Some(*human);
                }
            }

            let stored = controller.reviews().get(review.review.id).await.unwrap();
            for (project, expected) in stored.projects.iter().zip(&last) {
                assert_eq!(project.human_score.is_some(), project.final_score.is_some());
                assert_eq!(project.human_score, *expected);
                if let Some(h) = expected {
                    let want = score::combine(project.analysis.overall_score(), *h).unwrap();
                    assert_eq!(project.final_score, Some(want));
                }
            }
        });
    }
}
