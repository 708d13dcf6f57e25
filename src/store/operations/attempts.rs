use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::keys;
use crate::store::operations::items::ItemVariant;
use crate::store::{Store, StoreError};

/// Reference to a learning item: discriminator plus id, so attempts stay
/// valid across the polymorphic catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub variant: ItemVariant,
    pub id: String,
}

/// Extra telemetry carried by typing-word attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingMetrics {
    pub typing_speed_wpm: f64,
    pub response_time_ms: u64,
    pub wrong_count: u32,
    /// Per-keystroke mistakes: key character to miss count.
    #[serde(default)]
    pub mistakes: HashMap<char, u32>,
    /// Inter-keystroke timings in milliseconds.
    #[serde(default)]
    pub keystroke_timings_ms: Vec<u64>,
}

/// One graded attempt. Append-only and immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub item: ItemRef,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Numeric score in [0, 100].
    pub score: f64,
    /// Seconds spent on the attempt.
    pub time_spent_secs: u32,
    pub typing: Option<TypingMetrics>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn create_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        let key = keys::attempt_key(
            &attempt.user_id,
            attempt.created_at.timestamp_millis(),
            &attempt.id,
        );
        self.attempts
            .insert(key.as_bytes(), Self::serialize(attempt)?)?;
        Ok(())
    }

    /// Attempts within `[start, end)`, oldest first.
    pub fn list_attempts_window(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attempt>, StoreError> {
        if start >= end {
            return Ok(Vec::new());
        }

        let lower = keys::attempt_window_start(user_id, start.timestamp_millis());
        let upper = keys::attempt_window_end(user_id, end.timestamp_millis());

        let mut out = Vec::new();
        for entry in self.attempts.range(lower.as_bytes()..upper.as_bytes()) {
            let (_, value) = entry?;
            out.push(Self::deserialize::<Attempt>(&value)?);
        }
        Ok(out)
    }

    /// Most recent attempts first.
    pub fn list_recent_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Attempt>, StoreError> {
        let prefix = keys::attempt_prefix(user_id);
        let mut out = Vec::new();
        for entry in self.attempts.scan_prefix(prefix.as_bytes()).rev() {
            let (_, value) = entry?;
            out.push(Self::deserialize::<Attempt>(&value)?);
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    pub fn count_user_attempts(&self, user_id: &str) -> Result<u64, StoreError> {
        let prefix = keys::attempt_prefix(user_id);
        let mut count = 0u64;
        for entry in self.attempts.scan_prefix(prefix.as_bytes()) {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Distinct users with at least one attempt in `[start, end)`. Used by
    /// the daily aggregation worker to know whose stats to recompute.
    pub fn users_active_within(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let mut users = std::collections::BTreeSet::new();
        for entry in self.attempts.iter() {
            let (_, value) = entry?;
            let attempt: Attempt = Self::deserialize(&value)?;
            if attempt.created_at >= start && attempt.created_at < end {
                users.insert(attempt.user_id);
            }
        }
        Ok(users.into_iter().collect())
    }
}
