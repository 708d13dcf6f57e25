use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::KEY_WHITELIST;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// Cumulative miskey counter per (user, key character). Counts only ever
/// grow; merging is elementwise addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyErrorCounter {
    pub user_id: String,
    pub key: char,
    pub count: u64,
    pub last_error_date: NaiveDate,
}

/// The bounded key set: printable ASCII plus a short whitelist.
pub fn is_trackable_key(key: char) -> bool {
    (key.is_ascii_graphic()) || KEY_WHITELIST.contains(&key)
}

impl Store {
    /// Adds the observed per-key miss counts. Each key uses an atomic
    /// read-modify-write (`update_and_fetch`), so concurrent merges from
    /// parallel submissions cannot lose increments. Untrackable keys are
    /// dropped, not errors.
    pub fn merge_key_errors(
        &self,
        user_id: &str,
        mistakes: &HashMap<char, u32>,
        date: NaiveDate,
    ) -> Result<(), StoreError> {
        for (&key, &added) in mistakes {
            if added == 0 || !is_trackable_key(key) {
                continue;
            }

            let tree_key = keys::key_error_key(user_id, key);
            let user_id = user_id.to_string();
            self.key_errors
                .update_and_fetch(tree_key.as_bytes(), move |old| {
                    let mut counter = old
                        .and_then(|raw| serde_json::from_slice::<KeyErrorCounter>(raw).ok())
                        .unwrap_or(KeyErrorCounter {
                            user_id: user_id.clone(),
                            key,
                            count: 0,
                            last_error_date: date,
                        });
                    counter.count += u64::from(added);
                    if date > counter.last_error_date {
                        counter.last_error_date = date;
                    }
                    serde_json::to_vec(&counter).ok()
                })?;
        }
        Ok(())
    }

    /// Top miskeyed characters, count descending, ties alphabetical.
    pub fn top_key_errors(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<KeyErrorCounter>, StoreError> {
        let prefix = keys::key_error_prefix(user_id);
        let mut counters = Vec::new();
        for entry in self.key_errors.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            counters.push(Self::deserialize::<KeyErrorCounter>(&value)?);
        }
        counters.sort_by(|a, b| b.count.cmp(&a.count).then(a.key.cmp(&b.key)));
        counters.truncate(limit);
        Ok(counters)
    }
}
