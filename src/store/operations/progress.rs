use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;
use std::collections::HashSet;

use crate::constants::{MASTERED_MIN_REPETITIONS, MASTERY_THRESHOLD, MIN_EASE_FACTOR};
use crate::srs::SrsState;
use crate::store::keys;
use crate::store::operations::attempts::Attempt;
use crate::store::operations::items::map_tx_error;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotLearned,
    Learning,
    NeedReview,
    Mastered,
}

/// Per-(user, word) SRS state. `version` backs optimistic concurrency: every
/// committed update increments it by one, and writers state the version they
/// expect to replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub word_id: String,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub review_count: u32,
    pub mastery_level: f64,
    pub status: ProgressStatus,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// The first-write path of the lazy upsert: default SM-2 state, nothing
    /// reviewed yet.
    pub fn new_default(user_id: &str, word_id: &str, now: DateTime<Utc>) -> Self {
        let srs = SrsState::default();
        Self {
            user_id: user_id.to_string(),
            word_id: word_id.to_string(),
            ease_factor: srs.ease_factor,
            interval_days: srs.interval_days,
            repetition_count: srs.repetition_count,
            review_count: 0,
            mastery_level: 0.0,
            status: ProgressStatus::NotLearned,
            last_review_at: None,
            next_review_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn srs_state(&self) -> SrsState {
        SrsState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetition_count: self.repetition_count,
        }
    }

    /// Post-update invariants. A violation here is a defect in the engine,
    /// not a user error; it aborts the transaction.
    pub fn check_invariants(&self) -> Result<(), StoreError> {
        if self.ease_factor < MIN_EASE_FACTOR - 1e-9 {
            return Err(StoreError::Invariant(format!(
                "ease factor {} below floor {}",
                self.ease_factor, MIN_EASE_FACTOR
            )));
        }
        if !(0.0..=1.0).contains(&self.mastery_level) {
            return Err(StoreError::Invariant(format!(
                "mastery {} outside [0, 1]",
                self.mastery_level
            )));
        }
        if self.status == ProgressStatus::Mastered
            && (self.mastery_level < MASTERY_THRESHOLD
                || self.repetition_count < MASTERED_MIN_REPETITIONS)
        {
            return Err(StoreError::Invariant(format!(
                "mastered status with mastery {} and {} repetitions",
                self.mastery_level, self.repetition_count
            )));
        }
        if let (Some(last), Some(next)) = (self.last_review_at, self.next_review_at) {
            if next < last {
                return Err(StoreError::Invariant(
                    "next review scheduled before last review".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn due_key(&self) -> Option<String> {
        self.next_review_at.map(|next| {
            keys::progress_due_key(&self.user_id, next.timestamp_millis(), &self.word_id)
        })
    }
}

impl Store {
    pub fn get_progress(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<Progress>, StoreError> {
        let key = keys::progress_key(user_id, word_id);
        match self.progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Unconditional write, keeping the due index in step. Used by tests and
    /// migrations; the ingest path goes through `commit_attempt_with_progress`.
    pub fn put_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        let key = keys::progress_key(&progress.user_id, &progress.word_id);
        let value = Self::serialize(progress)?;
        let next_due_key = progress.due_key();

        (&self.progress, &self.progress_due_index)
            .transaction(|(tx_progress, tx_due)| {
                if let Some(old_raw) = tx_progress.get(key.as_bytes())? {
                    let old: Progress = serde_json::from_slice(&old_raw).map_err(|error| {
                        sled::transaction::ConflictableTransactionError::Abort(
                            StoreError::Serialization(error),
                        )
                    })?;
                    if let Some(old_due_key) = old.due_key() {
                        tx_due.remove(old_due_key.as_bytes())?;
                    }
                }

                tx_progress.insert(key.as_bytes(), value.as_slice())?;

                if let Some(due_key) = &next_due_key {
                    tx_due.insert(due_key.as_bytes(), &[])?;
                }

                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(())
    }

    /// Atomically appends an attempt and replaces the progress row, provided
    /// the stored version is exactly `progress.version - 1` (or the row is
    /// absent for a first write with version 1). On a version mismatch the
    /// transaction aborts with `Conflict` and nothing is written — neither
    /// the attempt nor the progress. Invariants are checked before touching
    /// the database.
    pub fn commit_attempt_with_progress(
        &self,
        attempt: &Attempt,
        progress: &Progress,
    ) -> Result<(), StoreError> {
        progress.check_invariants()?;
        if progress.version == 0 {
            return Err(StoreError::Invariant(
                "committed progress must have version >= 1".to_string(),
            ));
        }

        let progress_key = keys::progress_key(&progress.user_id, &progress.word_id);
        let progress_bytes = Self::serialize(progress)?;
        let next_due_key = progress.due_key();
        let expected_version = progress.version - 1;

        let attempt_key = keys::attempt_key(
            &attempt.user_id,
            attempt.created_at.timestamp_millis(),
            &attempt.id,
        );
        let attempt_bytes = Self::serialize(attempt)?;

        (&self.progress, &self.progress_due_index, &self.attempts)
            .transaction(|(tx_progress, tx_due, tx_attempts)| {
                let stored_version = match tx_progress.get(progress_key.as_bytes())? {
                    Some(old_raw) => {
                        let old: Progress = serde_json::from_slice(&old_raw).map_err(|error| {
                            sled::transaction::ConflictableTransactionError::Abort(
                                StoreError::Serialization(error),
                            )
                        })?;
                        if let Some(old_due_key) = old.due_key() {
                            tx_due.remove(old_due_key.as_bytes())?;
                        }
                        old.version
                    }
                    None => 0,
                };

                if stored_version != expected_version {
                    return Err(sled::transaction::ConflictableTransactionError::Abort(
                        StoreError::conflict("progress", &progress_key),
                    ));
                }

                tx_progress.insert(progress_key.as_bytes(), progress_bytes.as_slice())?;
                if let Some(due_key) = &next_due_key {
                    tx_due.insert(due_key.as_bytes(), &[])?;
                }
                tx_attempts.insert(attempt_key.as_bytes(), attempt_bytes.as_slice())?;

                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(())
    }

    /// Due reviews: progress with `next_review_at <= now` and a reviewable
    /// status, ordered by due time ascending (ties by word id via the key
    /// encoding). Stale index entries are skipped by re-checking the row.
    pub fn get_due_progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Progress>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let prefix = keys::progress_due_prefix(user_id);
        let now_ms = now.timestamp_millis();
        let mut due = Vec::with_capacity(limit);
        let mut seen = HashSet::new();

        for entry in self.progress_due_index.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            let Some((due_ts_ms, word_id)) = keys::parse_progress_due_key(&key) else {
                continue;
            };

            if due_ts_ms > now_ms {
                break;
            }

            let Some(progress) = self.get_progress(user_id, &word_id)? else {
                continue;
            };
            let Some(next_review_at) = progress.next_review_at else {
                continue;
            };
            if next_review_at.timestamp_millis() != due_ts_ms {
                continue; // stale index entry, superseded by a newer one
            }
            if !matches!(
                progress.status,
                ProgressStatus::Learning | ProgressStatus::NeedReview
            ) {
                continue;
            }
            if seen.insert(word_id) {
                due.push(progress);
                if due.len() >= limit {
                    break;
                }
            }
        }

        Ok(due)
    }

    /// Word ids the user already has progress for.
    pub fn progress_word_ids(&self, user_id: &str) -> Result<HashSet<String>, StoreError> {
        let prefix = keys::progress_prefix(user_id);
        let mut ids = HashSet::new();
        for entry in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let progress: Progress = Self::deserialize(&value)?;
            ids.insert(progress.word_id);
        }
        Ok(ids)
    }

    pub fn list_user_progress(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Progress>, StoreError> {
        let prefix = keys::progress_prefix(user_id);
        let mut out = Vec::new();
        for entry in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            out.push(Self::deserialize::<Progress>(&value)?);
        }
        Ok(out.into_iter().skip(offset).take(limit).collect())
    }

    /// Progress rows whose last review falls inside `[start, end)`. The stats
    /// aggregator derives learned/reviewed counts from these.
    pub fn progress_reviewed_within(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Progress>, StoreError> {
        let prefix = keys::progress_prefix(user_id);
        let mut out = Vec::new();
        for entry in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let progress: Progress = Self::deserialize(&value)?;
            if let Some(last) = progress.last_review_at {
                if last >= start && last < end {
                    out.push(progress);
                }
            }
        }
        Ok(out)
    }
}
