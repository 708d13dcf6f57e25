//! Pure SM-2 spaced-repetition engine.
//!
//! The engine is a side-effect-free fold: `(state, quality) -> state`. The
//! store and ingest layers own persistence; nothing in this module touches
//! the database.

pub mod mastery;
pub mod sm2;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SrsError {
    #[error("invalid recall grade {0}, expected 0..=5")]
    InvalidGrade(u8),
}

/// Recall grade for a single attempt. 0 = blackout, 1 = wrong but recalled on
/// seeing, 2 = wrong but easy to recall, 3 = right with difficulty,
/// 4 = right with hesitation, 5 = perfect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Result<Self, SrsError> {
        if value > 5 {
            return Err(SrsError::InvalidGrade(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Grade derived from a binary right/wrong outcome: 5 when correct,
    /// 2 when not.
    pub fn from_correctness(is_correct: bool) -> Self {
        if is_correct {
            Self(5)
        } else {
            Self(2)
        }
    }

    pub fn is_passing(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<u8> for Quality {
    type Error = SrsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(value: Quality) -> Self {
        value.0
    }
}

/// The scheduling slice of a progress row: everything SM-2 reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetition_count: u32,
}

impl Default for SrsState {
    fn default() -> Self {
        Self {
            ease_factor: constants::DEFAULT_EASE_FACTOR,
            interval_days: constants::DEFAULT_INTERVAL_DAYS,
            repetition_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_rejects_out_of_range() {
        assert_eq!(Quality::new(6), Err(SrsError::InvalidGrade(6)));
        assert_eq!(Quality::new(255), Err(SrsError::InvalidGrade(255)));
    }

    #[test]
    fn quality_accepts_full_range() {
        for q in 0..=5u8 {
            assert_eq!(Quality::new(q).unwrap().value(), q);
        }
    }

    #[test]
    fn correctness_maps_to_five_and_two() {
        assert_eq!(Quality::from_correctness(true).value(), 5);
        assert_eq!(Quality::from_correctness(false).value(), 2);
    }

    #[test]
    fn default_state_matches_sm2_defaults() {
        let s = SrsState::default();
        assert_eq!(s.ease_factor, 2.5);
        assert_eq!(s.interval_days, 1);
        assert_eq!(s.repetition_count, 0);
    }
}
