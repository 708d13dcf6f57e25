pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub items: sled::Tree,
    pub items_by_frequency: sled::Tree,
    pub dictionaries: sled::Tree,
    pub dictionary_words: sled::Tree,
    pub progress: sled::Tree,
    pub progress_due_index: sled::Tree,
    pub attempts: sled::Tree,
    pub daily_stats: sled::Tree,
    pub key_errors: sled::Tree,
    pub learning_plans: sled::Tree,
    pub pronunciation_attempts: sled::Tree,
    pub meta: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("CAS retry exhausted after {attempts} attempts: entity={entity}, key={key}")]
    CasRetryExhausted {
        entity: String,
        key: String,
        attempts: u32,
    },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl StoreError {
    pub fn not_found(entity: &str, key: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn conflict(entity: &str, key: &str) -> Self {
        Self::Conflict {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let items = db.open_tree(trees::ITEMS)?;
        let items_by_frequency = db.open_tree(trees::ITEMS_BY_FREQUENCY)?;
        let dictionaries = db.open_tree(trees::DICTIONARIES)?;
        let dictionary_words = db.open_tree(trees::DICTIONARY_WORDS)?;
        let progress = db.open_tree(trees::PROGRESS)?;
        let progress_due_index = db.open_tree(trees::PROGRESS_DUE_INDEX)?;
        let attempts = db.open_tree(trees::ATTEMPTS)?;
        let daily_stats = db.open_tree(trees::DAILY_STATS)?;
        let key_errors = db.open_tree(trees::KEY_ERRORS)?;
        let learning_plans = db.open_tree(trees::LEARNING_PLANS)?;
        let pronunciation_attempts = db.open_tree(trees::PRONUNCIATION_ATTEMPTS)?;
        let meta = db.open_tree(trees::META)?;

        Ok(Self {
            db,
            items,
            items_by_frequency,
            dictionaries,
            dictionary_words,
            progress,
            progress_due_index,
            attempts,
            daily_stats,
            key_errors,
            learning_plans,
            pronunciation_attempts,
            meta,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn raw_db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
