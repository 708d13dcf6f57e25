use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One scored spoken attempt. All sub-scores live on the 0–100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationAttempt {
    pub id: String,
    pub user_id: String,
    pub word_id: Option<String>,
    pub target_word: String,
    pub recognized_text: String,
    pub language: String,
    /// Opaque reference to the submitted audio (content hash).
    pub audio_ref: String,
    pub accuracy_score: f64,
    pub fluency_score: f64,
    pub completeness_score: f64,
    pub overall_score: f64,
    pub suggestions: Vec<String>,
    /// Provider name, or "fallback" when scoring degraded.
    pub source: String,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn create_pronunciation_attempt(
        &self,
        attempt: &PronunciationAttempt,
    ) -> Result<(), StoreError> {
        let key = keys::pronunciation_key(
            &attempt.user_id,
            attempt.created_at.timestamp_millis(),
            &attempt.id,
        );
        self.pronunciation_attempts
            .insert(key.as_bytes(), Self::serialize(attempt)?)?;
        Ok(())
    }

    pub fn list_recent_pronunciation_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PronunciationAttempt>, StoreError> {
        let prefix = keys::pronunciation_prefix(user_id);
        let mut out = Vec::new();
        for entry in self
            .pronunciation_attempts
            .scan_prefix(prefix.as_bytes())
            .rev()
        {
            let (_, value) = entry?;
            out.push(Self::deserialize::<PronunciationAttempt>(&value)?);
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    fn sample(id: &str, created_at: DateTime<Utc>) -> PronunciationAttempt {
        PronunciationAttempt {
            id: id.to_string(),
            user_id: "u1".to_string(),
            word_id: None,
            target_word: "hello".to_string(),
            recognized_text: "hello".to_string(),
            language: "en-US".to_string(),
            audio_ref: "sha256:abc".to_string(),
            accuracy_score: 100.0,
            fluency_score: 95.0,
            completeness_score: 100.0,
            overall_score: 98.0,
            suggestions: vec![],
            source: "mock".to_string(),
            success: true,
            created_at,
        }
    }

    #[test]
    fn recent_attempts_newest_first() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        let now = Utc::now();
        store
            .create_pronunciation_attempt(&sample("p1", now - Duration::minutes(2)))
            .unwrap();
        store.create_pronunciation_attempt(&sample("p2", now)).unwrap();

        let listed = store.list_recent_pronunciation_attempts("u1", 10).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "p2");
    }
}
