//! Mastery accumulation, orthogonal to the SM-2 interval schedule.

use crate::constants::{MASTERED_MIN_REPETITIONS, MASTERY_STEP_PER_QUALITY, MASTERY_THRESHOLD};

use super::Quality;

/// Moves mastery by `quality * 0.1`, clamped into [0, 1].
pub fn apply_mastery(mastery: f64, quality: Quality) -> f64 {
    (mastery + f64::from(quality.value()) * MASTERY_STEP_PER_QUALITY).clamp(0.0, 1.0)
}

/// The `mastered` invariant: mastery at or above the threshold and a minimum
/// number of consecutive successful repetitions. The invariant always wins
/// over the per-attempt increment.
pub fn is_mastered(mastery: f64, repetition_count: u32) -> bool {
    mastery >= MASTERY_THRESHOLD && repetition_count >= MASTERED_MIN_REPETITIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn perfect_grade_adds_half() {
        assert!((apply_mastery(0.0, q(5)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn mastery_is_clamped_to_one() {
        assert_eq!(apply_mastery(0.9, q(5)), 1.0);
    }

    #[test]
    fn blackout_leaves_mastery_unchanged() {
        assert_eq!(apply_mastery(0.4, q(0)), 0.4);
    }

    #[test]
    fn mastered_requires_both_conditions() {
        assert!(is_mastered(0.8, 3));
        assert!(!is_mastered(1.0, 2));
        assert!(!is_mastered(0.79, 5));
    }
}
