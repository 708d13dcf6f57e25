use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;
use std::collections::HashSet;

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Discriminator for the polymorphic learning-item catalog. Progress and
/// attempts reference items through `(variant, id)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemVariant {
    Word,
    Expression,
    NewsArticle,
    TypingWord,
}

impl ItemVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Expression => "expression",
            Self::NewsArticle => "news_article",
            Self::TypingWord => "typing_word",
        }
    }

    /// Variants that carry SRS progress.
    pub fn is_scheduled(self) -> bool {
        matches!(self, Self::Word | Self::TypingWord)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub source_url: Option<String>,
    pub license: Option<String>,
    /// Quality score in [0, 1]; defaults to 0 for untrusted sources.
    pub quality_score: f64,
}

/// Membership of a typing-word in exactly one (dictionary, chapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryRef {
    pub dictionary_id: String,
    pub chapter: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItem {
    pub id: String,
    pub variant: ItemVariant,
    /// Surface form: the word/expression text or the article title.
    pub text: String,
    pub phonetic: Option<String>,
    pub definition: Option<String>,
    pub difficulty: Difficulty,
    /// Lower rank = more common.
    pub frequency_rank: u32,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default)]
    pub dictionary_ref: Option<DictionaryRef>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearningItem {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.text.trim().is_empty() {
            return Err(StoreError::Validation(
                "item surface form must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.provenance.quality_score) {
            return Err(StoreError::Validation(
                "provenance quality score must be within [0, 1]".to_string(),
            ));
        }
        if self.dictionary_ref.is_some() && self.variant != ItemVariant::TypingWord {
            return Err(StoreError::Validation(
                "only typing-words belong to a dictionary chapter".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictionary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub chapter_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn create_item(&self, item: &LearningItem) -> Result<(), StoreError> {
        item.validate()?;

        let key = keys::item_key(&item.id);
        if self.items.contains_key(key.as_bytes())? {
            return Err(StoreError::conflict("item", &item.id));
        }

        let value = Self::serialize(item)?;
        let freq_key =
            keys::item_freq_index_key(item.variant.as_str(), item.frequency_rank, &item.id);

        (&self.items, &self.items_by_frequency)
            .transaction(|(tx_items, tx_freq)| {
                tx_items.insert(key.as_bytes(), value.as_slice())?;
                tx_freq.insert(freq_key.as_bytes(), &[])?;
                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(())
    }

    pub fn get_item(&self, item_id: &str) -> Result<Option<LearningItem>, StoreError> {
        match self.items.get(keys::item_key(item_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Fetches an item that must exist and must not be soft-deleted. Deleted
    /// items are reported as not found, never silently substituted.
    pub fn get_active_item(&self, item_id: &str) -> Result<LearningItem, StoreError> {
        let item = self
            .get_item(item_id)?
            .ok_or_else(|| StoreError::not_found("item", item_id))?;
        if item.deleted {
            return Err(StoreError::not_found("item", item_id));
        }
        Ok(item)
    }

    pub fn list_items(
        &self,
        variant: Option<ItemVariant>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LearningItem>, StoreError> {
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for entry in self.items.iter() {
            let (_, value) = entry?;
            let item: LearningItem = Self::deserialize(&value)?;
            if item.deleted {
                continue;
            }
            if let Some(v) = variant {
                if item.variant != v {
                    continue;
                }
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            out.push(item);
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    pub fn count_items(&self, variant: Option<ItemVariant>) -> Result<u64, StoreError> {
        let mut count = 0u64;
        for entry in self.items.iter() {
            let (_, value) = entry?;
            let item: LearningItem = Self::deserialize(&value)?;
            if item.deleted {
                continue;
            }
            if variant.is_none() || variant == Some(item.variant) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Flags an item as deleted. Items are never hard-deleted while progress
    /// may reference them; the frequency index entry stays behind and readers
    /// filter on the flag.
    pub fn soft_delete_item(&self, item_id: &str) -> Result<LearningItem, StoreError> {
        let mut item = self
            .get_item(item_id)?
            .ok_or_else(|| StoreError::not_found("item", item_id))?;
        if item.deleted {
            return Ok(item);
        }

        let now = Utc::now();
        item.deleted = true;
        item.deleted_at = Some(now);
        item.updated_at = now;
        self.items
            .insert(keys::item_key(item_id).as_bytes(), Self::serialize(&item)?)?;
        Ok(item)
    }

    /// New-item candidates for the planner: items of `variant` the user has
    /// no progress for, in ascending frequency-rank order (ties by id, which
    /// the index key encoding already guarantees).
    pub fn list_new_items(
        &self,
        variant: ItemVariant,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<LearningItem>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let prefix = keys::item_freq_index_prefix(variant.as_str());
        let mut out = Vec::with_capacity(limit);

        for entry in self.items_by_frequency.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            let Some((_, item_id)) = keys::parse_item_freq_index_key(&key) else {
                continue;
            };
            if exclude.contains(&item_id) {
                continue;
            }
            let Some(item) = self.get_item(&item_id)? else {
                continue;
            };
            if item.deleted {
                continue;
            }
            out.push(item);
            if out.len() >= limit {
                break;
            }
        }

        Ok(out)
    }

    pub fn create_dictionary(&self, dictionary: &Dictionary) -> Result<(), StoreError> {
        if dictionary.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "dictionary name must not be empty".to_string(),
            ));
        }
        let key = keys::dictionary_key(&dictionary.id);
        if self.dictionaries.contains_key(key.as_bytes())? {
            return Err(StoreError::conflict("dictionary", &dictionary.id));
        }
        self.dictionaries
            .insert(key.as_bytes(), Self::serialize(dictionary)?)?;
        Ok(())
    }

    pub fn get_dictionary(&self, dictionary_id: &str) -> Result<Option<Dictionary>, StoreError> {
        match self
            .dictionaries
            .get(keys::dictionary_key(dictionary_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Assigns a typing-word to a (dictionary, chapter). Each typing-word
    /// belongs to exactly one chapter; reassignment is a conflict.
    pub fn add_word_to_chapter(
        &self,
        dictionary_id: &str,
        chapter: u32,
        item_id: &str,
    ) -> Result<(), StoreError> {
        if chapter == 0 {
            return Err(StoreError::Validation(
                "chapters are numbered from 1".to_string(),
            ));
        }
        let dictionary = self
            .get_dictionary(dictionary_id)?
            .ok_or_else(|| StoreError::not_found("dictionary", dictionary_id))?;
        if chapter > dictionary.chapter_count {
            return Err(StoreError::Validation(format!(
                "dictionary {} has {} chapters",
                dictionary_id, dictionary.chapter_count
            )));
        }

        let mut item = self.get_active_item(item_id)?;
        if item.variant != ItemVariant::TypingWord {
            return Err(StoreError::Validation(
                "only typing-words can join a dictionary chapter".to_string(),
            ));
        }
        if item.dictionary_ref.is_some() {
            return Err(StoreError::conflict("dictionary_word", item_id));
        }

        item.dictionary_ref = Some(DictionaryRef {
            dictionary_id: dictionary_id.to_string(),
            chapter,
        });
        item.updated_at = Utc::now();

        let item_key = keys::item_key(item_id);
        let item_bytes = Self::serialize(&item)?;
        let member_key = keys::dictionary_word_key(dictionary_id, chapter, item_id);

        (&self.items, &self.dictionary_words)
            .transaction(|(tx_items, tx_members)| {
                tx_items.insert(item_key.as_bytes(), item_bytes.as_slice())?;
                tx_members.insert(member_key.as_bytes(), &[])?;
                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(())
    }

    pub fn list_chapter_words(
        &self,
        dictionary_id: &str,
        chapter: u32,
        limit: usize,
    ) -> Result<Vec<LearningItem>, StoreError> {
        let prefix = keys::dictionary_chapter_prefix(dictionary_id, chapter);
        let mut out = Vec::new();
        for entry in self.dictionary_words.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            let Some(item_id) = text.rsplit(':').next() else {
                continue;
            };
            if let Some(item) = self.get_item(item_id)? {
                if !item.deleted {
                    out.push(item);
                }
            }
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }
}

pub(crate) fn map_tx_error(error: sled::transaction::TransactionError<StoreError>) -> StoreError {
    match error {
        sled::transaction::TransactionError::Abort(store_error) => store_error,
        sled::transaction::TransactionError::Storage(storage_error) => {
            StoreError::Sled(storage_error)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tempfile::tempdir;

    use super::*;

    pub(crate) fn mock_item(id: &str, variant: ItemVariant, rank: u32) -> LearningItem {
        let now = Utc::now();
        LearningItem {
            id: id.to_string(),
            variant,
            text: format!("text-{id}"),
            phonetic: None,
            definition: Some(format!("definition of {id}")),
            difficulty: Difficulty::Beginner,
            frequency_rank: rank,
            provenance: Provenance::default(),
            dictionary_ref: None,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_and_get_item() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_item(&mock_item("w1", ItemVariant::Word, 10))
            .unwrap();

        let found = store.get_item("w1").unwrap().unwrap();
        assert_eq!(found.text, "text-w1");
        assert_eq!(found.variant, ItemVariant::Word);
    }

    #[test]
    fn duplicate_id_is_conflict() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_item(&mock_item("w1", ItemVariant::Word, 10))
            .unwrap();
        let err = store
            .create_item(&mock_item("w1", ItemVariant::Word, 11))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn empty_surface_form_is_rejected() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        let mut item = mock_item("w1", ItemVariant::Word, 1);
        item.text = "   ".to_string();
        let err = store.create_item(&item).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn soft_deleted_item_is_not_active() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_item(&mock_item("w1", ItemVariant::Word, 10))
            .unwrap();
        store.soft_delete_item("w1").unwrap();

        assert!(store.get_item("w1").unwrap().unwrap().deleted);
        let err = store.get_active_item("w1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn new_items_come_back_by_frequency_rank() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_item(&mock_item("rare", ItemVariant::Word, 900))
            .unwrap();
        store
            .create_item(&mock_item("common", ItemVariant::Word, 5))
            .unwrap();
        store
            .create_item(&mock_item("mid", ItemVariant::Word, 80))
            .unwrap();

        let listed = store
            .list_new_items(ItemVariant::Word, &HashSet::new(), 10)
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["common", "mid", "rare"]);
    }

    #[test]
    fn new_items_exclude_deleted_and_known() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_item(&mock_item("w1", ItemVariant::Word, 1))
            .unwrap();
        store
            .create_item(&mock_item("w2", ItemVariant::Word, 2))
            .unwrap();
        store
            .create_item(&mock_item("w3", ItemVariant::Word, 3))
            .unwrap();
        store.soft_delete_item("w2").unwrap();

        let mut known = HashSet::new();
        known.insert("w1".to_string());

        let listed = store.list_new_items(ItemVariant::Word, &known, 10).unwrap();
        let ids: Vec<_> = listed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["w3"]);
    }

    #[test]
    fn typing_word_joins_exactly_one_chapter() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_dictionary(&Dictionary {
                id: "d1".to_string(),
                name: "Basics".to_string(),
                description: None,
                chapter_count: 3,
                created_at: Utc::now(),
            })
            .unwrap();
        store
            .create_item(&mock_item("t1", ItemVariant::TypingWord, 1))
            .unwrap();

        store.add_word_to_chapter("d1", 2, "t1").unwrap();
        let err = store.add_word_to_chapter("d1", 3, "t1").unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let chapter = store.list_chapter_words("d1", 2, 10).unwrap();
        assert_eq!(chapter.len(), 1);
        assert_eq!(chapter[0].id, "t1");
    }

    #[test]
    fn non_typing_word_cannot_join_chapter() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .create_dictionary(&Dictionary {
                id: "d1".to_string(),
                name: "Basics".to_string(),
                description: None,
                chapter_count: 1,
                created_at: Utc::now(),
            })
            .unwrap();
        store
            .create_item(&mock_item("w1", ItemVariant::Word, 1))
            .unwrap();

        let err = store.add_word_to_chapter("d1", 1, "w1").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
