//! The SM-2 update rule.

use crate::constants::MIN_EASE_FACTOR;

use super::{Quality, SrsState};

/// Applies one graded review to an SRS state and returns the next state.
///
/// Ease always moves first, then the repetition/interval step: a failing
/// grade (`q < 3`) resets the repetition streak and schedules a next-day
/// retry; a passing grade grows the interval on the classic 1, 6,
/// `round(interval * ef)` ladder.
pub fn review(state: SrsState, quality: Quality) -> SrsState {
    let q = f64::from(quality.value());
    let ease = state.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    let ease = ease.max(MIN_EASE_FACTOR);

    if !quality.is_passing() {
        return SrsState {
            ease_factor: ease,
            interval_days: 1,
            repetition_count: 0,
        };
    }

    let repetition_count = state.repetition_count + 1;
    let interval_days = match repetition_count {
        1 => 1,
        2 => 6,
        _ => (f64::from(state.interval_days) * ease).round().max(1.0) as u32,
    };

    SrsState {
        ease_factor: ease,
        interval_days,
        repetition_count,
    }
}

/// Folds a whole grade history over the default state. The final persisted
/// progress for a (user, word) pair must equal this fold in commit order.
pub fn replay<I>(grades: I) -> SrsState
where
    I: IntoIterator<Item = Quality>,
{
    grades.into_iter().fold(SrsState::default(), review)
}
