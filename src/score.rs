//! # Score Combiner
//!
//! A project's final score is the mean of the AI-derived `overall_score` and the
//! reviewer's human score, rounded half-up to an integer.
//!
//! Human scores are integers in [`MIN_HUMAN_SCORE`]..=[`MAX_HUMAN_SCORE`]. Zero is
//! rejected: a project counts as scored only once a reviewer has given it a
//! strictly positive mark.

use crate::error::{Result, ReviewError};

pub const MIN_HUMAN_SCORE: i32 = 1;
pub const MAX_HUMAN_SCORE: i32 = 100;

/// Bounds of an AI `overall_score` as produced by the analysis backend.
pub const MIN_AI_SCORE: f64 = 0.0;
pub const MAX_AI_SCORE: f64 = 100.0;

/// Check a human score against the accepted range.
pub fn validate_human_score(human_score: i32) -> Result<()> {
    if !(MIN_HUMAN_SCORE..=MAX_HUMAN_SCORE).contains(&human_score) {
        return Err(ReviewError::validation(format!(
            "human score must be between {} and {}, got {}",
            MIN_HUMAN_SCORE, MAX_HUMAN_SCORE, human_score
        )));
    }
    Ok(())
}

/// Check an AI score as received from the analysis backend.
pub fn validate_ai_score(ai_score: f64) -> Result<()> {
    if !ai_score.is_finite() || !(MIN_AI_SCORE..=MAX_AI_SCORE).contains(&ai_score) {
        return Err(ReviewError::validation(format!(
            "overall_score must be a number between {} and {}, got {}",
            MIN_AI_SCORE, MAX_AI_SCORE, ai_score
        )));
    }
    Ok(())
}

/// Combine an AI score and a human score into the final score.
///
/// `round((ai + human) / 2)` with ties rounded up, so `(81 + 50) / 2 = 65.5`
/// becomes 66.
pub fn combine(ai_score: f64, human_score: i32) -> Result<i32> {
    if !ai_score.is_finite() {
        return Err(ReviewError::validation(format!(
            "AI score must be finite, got {}",
            ai_score
        )));
    }
    validate_human_score(human_score)?;

    let mean = (ai_score + f64::from(human_score)) / 2.0;
    Ok((mean + 0.5).floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_exact_mean() {
        assert_eq!(combine(90.0, 70).unwrap(), 80);
    }

    #[test]
    fn combine_rounds_half_up() {
        assert_eq!(combine(81.0, 50).unwrap(), 66);
        assert_eq!(combine(0.0, 1).unwrap(), 1);
        assert_eq!(combine(100.0, 99).unwrap(), 100);
    }

    #[test]
    fn combine_fractional_ai_score() {
        // 72.4 + 60 = 132.4 → 66.2 → 66
        assert_eq!(combine(72.4, 60).unwrap(), 66);
        // 72.6 + 60 = 132.6 → 66.3 → 66
        assert_eq!(combine(72.6, 60).unwrap(), 66);
        // 73.2 + 60 = 133.2 → 66.6 → 67
        assert_eq!(combine(73.2, 60).unwrap(), 67);
    }

    #[test]
    fn combine_rejects_zero_human_score() {
        let err = combine(50.0, 0).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
    }

    #[test]
    fn combine_rejects_out_of_range_human_score() {
        assert!(combine(50.0, 101).is_err());
        assert!(combine(50.0, -5).is_err());
    }

    #[test]
    fn combine_rejects_non_finite_ai_score() {
        assert!(combine(f64::NAN, 50).is_err());
        assert!(combine(f64::INFINITY, 50).is_err());
    }

    #[test]
    fn combine_bounds_are_inclusive() {
        assert_eq!(combine(100.0, 100).unwrap(), 100);
        assert_eq!(combine(0.0, 1).unwrap(), 1);
    }

    #[test]
    fn ai_score_validation() {
        assert!(validate_ai_score(0.0).is_ok());
        assert!(validate_ai_score(100.0).is_ok());
        assert!(validate_ai_score(-0.1).is_err());
        assert!(validate_ai_score(100.5).is_err());
        assert!(validate_ai_score(f64::NAN).is_err());
    }
}
