//! Daily session planning: due reviews first, then new material up to the
//! plan's targets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::store::operations::items::{ItemVariant, LearningItem};
use crate::store::operations::progress::Progress;
use crate::store::{Store, StoreError};

/// How many expression candidates the sampler draws from. Bounded so plan
/// generation stays cheap on large catalogs.
const EXPRESSION_CANDIDATE_POOL: usize = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub item: LearningItem,
    pub progress: Progress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    pub date: NaiveDate,
    pub word_target: u32,
    pub expression_target: u32,
    pub review_words: Vec<ReviewEntry>,
    pub new_words: Vec<LearningItem>,
    pub expressions: Vec<LearningItem>,
}

/// Builds the plan for `now`'s UTC date.
///
/// Targets come from the explicitly named plan, or from the active plan
/// covering the date; a plan that is missing or does not cover the date is
/// not found, never silently replaced. Reviews take priority but never crowd
/// out new material entirely: they are capped at half the word target
/// (floored), and new words fill whatever remains. Fewer candidates than
/// targets yields a short plan, never an error. The expression pick is
/// seeded from (user, date) so replanning the same day returns the same
/// session.
pub fn plan_daily_session(
    store: &Store,
    user_id: &str,
    plan_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SessionPlan, StoreError> {
    let date = now.date_naive();
    let plan = match plan_id {
        Some(id) => {
            let plan = store
                .get_plan(user_id, id)?
                .ok_or_else(|| StoreError::not_found("plan", id))?;
            if !plan.covers(date) {
                return Err(StoreError::not_found("plan", id));
            }
            plan
        }
        None => store
            .active_plan_for_date(user_id, date)?
            .ok_or_else(|| StoreError::not_found("plan", user_id))?,
    };
    let word_target = plan.daily_word_target;
    let expression_target = plan.daily_expression_target;

    let review_cap = (word_target / 2) as usize;
    let due = store.get_due_progress(user_id, now, review_cap)?;

    let mut review_words = Vec::with_capacity(due.len());
    for progress in due {
        // The item may have been soft-deleted since it was scheduled.
        match store.get_item(&progress.word_id)? {
            Some(item) if !item.deleted => review_words.push(ReviewEntry { item, progress }),
            _ => continue,
        }
    }

    let known = store.progress_word_ids(user_id)?;
    let new_quota = (word_target as usize).saturating_sub(review_words.len());
    let new_words = store.list_new_items(ItemVariant::Word, &known, new_quota)?;

    let candidates = store.list_new_items(
        ItemVariant::Expression,
        &known,
        EXPRESSION_CANDIDATE_POOL,
    )?;
    let mut rng = StdRng::seed_from_u64(session_seed(user_id, date));
    let mut expressions: Vec<LearningItem> = candidates
        .choose_multiple(&mut rng, expression_target as usize)
        .cloned()
        .collect();
    expressions.sort_by(|a, b| a.frequency_rank.cmp(&b.frequency_rank).then(a.id.cmp(&b.id)));

    Ok(SessionPlan {
        date,
        word_target,
        expression_target,
        review_words,
        new_words,
        expressions,
    })
}

fn session_seed(user_id: &str, date: NaiveDate) -> u64 {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    date.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use crate::store::operations::items::tests::mock_item;
    use crate::store::operations::plans::tests::mock_plan;
    use crate::store::operations::progress::tests::mock_progress;

    use super::*;

    fn setup() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        (dir, store)
    }

    fn seed_words(store: &Store, count: u32) {
        for i in 0..count {
            store
                .create_item(&mock_item(&format!("w{i:03}"), ItemVariant::Word, i + 1))
                .unwrap();
        }
    }

    fn make_due(store: &Store, word_id: &str, now: DateTime<Utc>, minutes_ago: i64) {
        let mut p = mock_progress("u1", word_id, 1);
        p.next_review_at = Some(now - Duration::minutes(minutes_ago));
        store.put_progress(&p).unwrap();
    }

    fn seed_plan(store: &Store, id: &str, now: DateTime<Utc>) {
        store
            .create_plan(&mock_plan(
                id,
                "u1",
                &(now.date_naive() - Duration::days(1))
                    .format("%Y-%m-%d")
                    .to_string(),
                None,
            ))
            .unwrap();
    }

    #[test]
    fn reviews_capped_at_half_then_new_words_fill() {
        let (_dir, store) = setup();
        seed_words(&store, 30);

        let now = Utc::now();
        seed_plan(&store, "p1", now);

        // mock_plan targets 10 words; 4 due reviews -> 4 reviews + 6 new.
        for (i, word) in ["w000", "w001", "w002", "w003"].iter().enumerate() {
            make_due(&store, word, now, 10 - i as i64);
        }

        let plan = plan_daily_session(&store, "u1", None, now).unwrap();
        assert_eq!(plan.word_target, 10);
        assert_eq!(plan.review_words.len(), 4);
        assert_eq!(plan.new_words.len(), 6);

        // New words skip everything with progress and follow frequency rank.
        let ids: Vec<_> = plan.new_words.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["w004", "w005", "w006", "w007", "w008", "w009"]);
    }

    #[test]
    fn many_due_reviews_never_crowd_out_new_words() {
        let (_dir, store) = setup();
        seed_words(&store, 30);

        let now = Utc::now();
        seed_plan(&store, "p1", now);

        for i in 0..12u32 {
            make_due(&store, &format!("w{i:03}"), now, 60 - i64::from(i));
        }

        let plan = plan_daily_session(&store, "u1", None, now).unwrap();
        assert_eq!(plan.review_words.len(), 5);
        assert_eq!(plan.new_words.len(), 5);
        assert!(
            plan.review_words.len() + plan.new_words.len() <= plan.word_target as usize
        );
    }

    #[test]
    fn missing_plan_is_not_found() {
        let (_dir, store) = setup();
        seed_words(&store, 30);

        let err = plan_daily_session(&store, "u1", None, Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn explicit_plan_id_resolves_even_when_inactive_elsewhere() {
        let (_dir, store) = setup();
        seed_words(&store, 30);
        let now = Utc::now();
        seed_plan(&store, "p1", now);

        let plan = plan_daily_session(&store, "u1", Some("p1"), now).unwrap();
        assert_eq!(plan.word_target, 10);

        let err = plan_daily_session(&store, "u1", Some("nope"), now).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn plan_not_covering_the_date_is_not_found() {
        let (_dir, store) = setup();
        seed_words(&store, 5);
        let now = Utc::now();

        let start = (now.date_naive() - Duration::days(30))
            .format("%Y-%m-%d")
            .to_string();
        let end = (now.date_naive() - Duration::days(10))
            .format("%Y-%m-%d")
            .to_string();
        store
            .create_plan(&mock_plan("p1", "u1", &start, Some(&end)))
            .unwrap();

        let err = plan_daily_session(&store, "u1", Some("p1"), now).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn sparse_catalog_yields_short_plan() {
        let (_dir, store) = setup();
        seed_words(&store, 3);
        let now = Utc::now();
        seed_plan(&store, "p1", now);

        let plan = plan_daily_session(&store, "u1", None, now).unwrap();
        assert_eq!(plan.new_words.len(), 3);
        assert!(plan.review_words.is_empty());
    }

    #[test]
    fn expression_pick_is_deterministic_per_day() {
        let (_dir, store) = setup();
        for i in 0..10u32 {
            store
                .create_item(&mock_item(&format!("e{i}"), ItemVariant::Expression, i + 1))
                .unwrap();
        }

        let now = Utc::now();
        seed_plan(&store, "p1", now);
        let first = plan_daily_session(&store, "u1", None, now).unwrap();
        let second = plan_daily_session(&store, "u1", None, now).unwrap();

        let a: Vec<_> = first.expressions.iter().map(|e| e.id.clone()).collect();
        let b: Vec<_> = second.expressions.iter().map(|e| e.id.clone()).collect();
        assert_eq!(a, b);
        // mock_plan targets 2 expressions.
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn deleted_review_items_are_skipped() {
        let (_dir, store) = setup();
        seed_words(&store, 5);

        let now = Utc::now();
        seed_plan(&store, "p1", now);
        make_due(&store, "w000", now, 5);
        make_due(&store, "w001", now, 4);
        store.soft_delete_item("w000").unwrap();

        let plan = plan_daily_session(&store, "u1", None, now).unwrap();
        let review_ids: Vec<_> = plan
            .review_words
            .iter()
            .map(|r| r.item.id.as_str())
            .collect();
        assert_eq!(review_ids, vec!["w001"]);
    }
}
