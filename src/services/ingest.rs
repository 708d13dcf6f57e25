//! Practice ingestion: grade an answer, fold it into the SM-2 schedule, and
//! commit attempt plus progress atomically.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::MAX_CAS_RETRIES;
use crate::events::{AuditEvent, EventBus};
use crate::srs::mastery::{apply_mastery, is_mastered};
use crate::srs::{sm2, Quality};
use crate::store::operations::attempts::{Attempt, ItemRef, TypingMetrics};
use crate::store::operations::items::LearningItem;
use crate::store::operations::progress::{Progress, ProgressStatus};
use crate::store::{keys, Store, StoreError};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttempt {
    pub item_id: String,
    pub user_answer: String,
    #[serde(default)]
    pub time_spent_secs: u32,
    #[serde(default)]
    pub typing: Option<TypingMetrics>,
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub attempt: Attempt,
    /// Absent for variants outside the SRS schedule.
    pub progress: Option<Progress>,
}

/// Answers are compared case-insensitively after trimming.
fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

fn validate_typing(metrics: &TypingMetrics) -> Result<(), StoreError> {
    validation::validate_typing_speed(metrics.typing_speed_wpm)
        .map_err(|msg| StoreError::Validation(msg.to_string()))
}

/// Folds one graded attempt into a progress row. Pure: the caller owns the
/// read-modify-write cycle around it.
pub fn fold_progress(current: &Progress, quality: Quality, now: DateTime<Utc>) -> Progress {
    let srs = sm2::review(current.srs_state(), quality);
    let mastery = apply_mastery(current.mastery_level, quality);

    let status = if is_mastered(mastery, srs.repetition_count) {
        ProgressStatus::Mastered
    } else if !quality.is_passing() && current.status == ProgressStatus::Mastered {
        ProgressStatus::NeedReview
    } else {
        ProgressStatus::Learning
    };

    Progress {
        user_id: current.user_id.clone(),
        word_id: current.word_id.clone(),
        ease_factor: srs.ease_factor,
        interval_days: srs.interval_days,
        repetition_count: srs.repetition_count,
        review_count: current.review_count + 1,
        mastery_level: mastery,
        status,
        last_review_at: Some(now),
        next_review_at: Some(now + Duration::days(i64::from(srs.interval_days))),
        version: current.version + 1,
        created_at: current.created_at,
        updated_at: now,
    }
}

fn build_attempt(
    user_id: &str,
    item: &LearningItem,
    request: &SubmitAttempt,
    is_correct: bool,
    now: DateTime<Utc>,
) -> Attempt {
    Attempt {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        item: ItemRef {
            variant: item.variant,
            id: item.id.clone(),
        },
        question: item
            .definition
            .clone()
            .unwrap_or_else(|| item.text.clone()),
        user_answer: request.user_answer.clone(),
        correct_answer: item.text.clone(),
        is_correct,
        score: if is_correct { 100.0 } else { 0.0 },
        time_spent_secs: request.time_spent_secs,
        typing: request.typing.clone(),
        created_at: now,
    }
}

/// Grades and persists one attempt. For scheduled variants the progress
/// update runs under optimistic concurrency: on a version conflict the
/// whole read-fold-commit cycle retries, up to [`MAX_CAS_RETRIES`] times.
pub fn submit_attempt(
    store: &Store,
    events: &EventBus,
    user_id: &str,
    request: &SubmitAttempt,
) -> Result<SubmitOutcome, StoreError> {
    if let Some(typing) = &request.typing {
        validate_typing(typing)?;
    }

    let item = store.get_active_item(&request.item_id)?;
    let is_correct = normalize_answer(&request.user_answer) == normalize_answer(&item.text);
    let now = Utc::now();
    let attempt = build_attempt(user_id, &item, request, is_correct, now);

    let progress = if item.variant.is_scheduled() {
        Some(commit_with_retries(store, user_id, &item.id, &attempt, is_correct, now)?)
    } else {
        store.create_attempt(&attempt)?;
        None
    };

    if let Some(typing) = &attempt.typing {
        store.merge_key_errors(user_id, &typing.mistakes, now.date_naive())?;
    }

    events.emit(AuditEvent::AttemptRecorded {
        user_id: user_id.to_string(),
        attempt_id: attempt.id.clone(),
        item_id: item.id.clone(),
        variant: item.variant,
        is_correct,
        at: now,
    });
    if let Some(progress) = &progress {
        events.emit(AuditEvent::ProgressUpdated {
            user_id: user_id.to_string(),
            word_id: progress.word_id.clone(),
            status: progress.status,
            mastery_level: progress.mastery_level,
            next_review_at: progress.next_review_at,
            at: now,
        });
    }

    Ok(SubmitOutcome { attempt, progress })
}

fn commit_with_retries(
    store: &Store,
    user_id: &str,
    word_id: &str,
    attempt: &Attempt,
    is_correct: bool,
    now: DateTime<Utc>,
) -> Result<Progress, StoreError> {
    let quality = Quality::from_correctness(is_correct);

    for _ in 0..MAX_CAS_RETRIES {
        let current = store
            .get_progress(user_id, word_id)?
            .unwrap_or_else(|| Progress::new_default(user_id, word_id, now));
        let next = fold_progress(&current, quality, now);

        match store.commit_attempt_with_progress(attempt, &next) {
            Ok(()) => return Ok(next),
            Err(StoreError::Conflict { .. }) => {
                tracing::debug!(user_id, word_id, "Progress version conflict, retrying");
                continue;
            }
            Err(other) => return Err(other),
        }
    }

    Err(StoreError::CasRetryExhausted {
        entity: "progress".to_string(),
        key: keys::progress_key(user_id, word_id),
        attempts: MAX_CAS_RETRIES,
    })
}
