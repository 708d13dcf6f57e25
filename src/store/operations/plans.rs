use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFrequency {
    Daily,
    Weekly,
    Custom,
}

/// A learner's daily targets. Several plans may exist per user, but at most
/// one active plan may cover any given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlan {
    pub id: String,
    pub user_id: String,
    pub daily_word_target: u32,
    pub daily_expression_target: u32,
    pub review_frequency: ReviewFrequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearningPlan {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.start_date <= date && self.end_date.map_or(true, |end| date <= end)
    }

    fn overlaps(&self, other: &LearningPlan) -> bool {
        let self_end = self.end_date.unwrap_or(NaiveDate::MAX);
        let other_end = other.end_date.unwrap_or(NaiveDate::MAX);
        self.start_date <= other_end && other.start_date <= self_end
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.daily_word_target == 0 {
            return Err(StoreError::Validation(
                "daily word target must be at least 1".to_string(),
            ));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(StoreError::Validation(
                    "plan end date precedes start date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Store {
    /// Creates a plan. Activating a plan whose date range overlaps another
    /// active plan of the same user is a conflict, which keeps the
    /// one-active-plan-per-date invariant enforceable at write time.
    pub fn create_plan(&self, plan: &LearningPlan) -> Result<(), StoreError> {
        plan.validate()?;

        let key = keys::plan_key(&plan.user_id, &plan.id);
        if self.learning_plans.contains_key(key.as_bytes())? {
            return Err(StoreError::conflict("plan", &plan.id));
        }

        if plan.active {
            for existing in self.list_plans(&plan.user_id)? {
                if existing.active && existing.overlaps(plan) {
                    return Err(StoreError::conflict("plan", &existing.id));
                }
            }
        }

        self.learning_plans
            .insert(key.as_bytes(), Self::serialize(plan)?)?;
        Ok(())
    }

    pub fn get_plan(&self, user_id: &str, plan_id: &str) -> Result<Option<LearningPlan>, StoreError> {
        let key = keys::plan_key(user_id, plan_id);
        match self.learning_plans.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_plans(&self, user_id: &str) -> Result<Vec<LearningPlan>, StoreError> {
        let prefix = keys::plan_prefix(user_id);
        let mut out = Vec::new();
        for entry in self.learning_plans.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            out.push(Self::deserialize::<LearningPlan>(&value)?);
        }
        Ok(out)
    }

    /// The single active plan covering `date`, if any.
    pub fn active_plan_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LearningPlan>, StoreError> {
        Ok(self
            .list_plans(user_id)?
            .into_iter()
            .find(|plan| plan.covers(date)))
    }
}
