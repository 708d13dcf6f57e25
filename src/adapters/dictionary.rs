//! Dictionary lookups against dictionaryapi.dev, with a 1 hour cache and a
//! minimal deterministic fallback entry when the provider is out.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::config::AdapterConfig;

use super::cache::TtlCache;
use super::{build_client, new_semaphore, AdapterError, ProviderHealth};

const PROVIDER: &str = "dictionaryapi";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    pub definitions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    pub phonetic: Option<String>,
    pub meanings: Vec<Meaning>,
    /// Provider name, "cache" semantics are invisible here: cached entries
    /// keep the source they were fetched with. "fallback" marks degraded
    /// output.
    pub source: String,
}

/// Wire shape of a dictionaryapi.dev response element.
#[derive(Debug, Deserialize)]
struct WireEntry {
    word: String,
    phonetic: Option<String>,
    #[serde(default)]
    meanings: Vec<WireMeaning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMeaning {
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<WireDefinition>,
}

#[derive(Debug, Deserialize)]
struct WireDefinition {
    definition: String,
}

#[derive(Debug)]
pub struct DictionaryAdapter {
    client: reqwest::Client,
    base_url: String,
    mock: bool,
    cache_ttl: Duration,
    pub cache: TtlCache<DictionaryEntry>,
    pub health: ProviderHealth,
    permits: Arc<Semaphore>,
}

impl DictionaryAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            client: build_client(config.dictionary_timeout_secs),
            base_url: config.dictionary_api_url.clone(),
            mock: config.mock,
            cache_ttl: Duration::from_secs(config.dictionary_cache_ttl_secs),
            cache: TtlCache::new(),
            health: ProviderHealth::new(PROVIDER),
            permits: new_semaphore(config.max_concurrent_per_provider),
        }
    }

    /// Looks a word up, serving from cache when fresh. Degraded providers and
    /// failed calls fall back to a stub entry instead of erroring: a missing
    /// definition is not worth failing a practice flow over.
    pub async fn lookup(&self, word: &str) -> DictionaryEntry {
        let normalized = word.trim().to_lowercase();
        let cache_key = format!("{PROVIDER}:{normalized}");

        if let Some(entry) = self.cache.get(&cache_key) {
            return entry;
        }

        if self.mock {
            let entry = mock_entry(&normalized);
            self.cache.put(cache_key, entry.clone(), self.cache_ttl);
            return entry;
        }

        if self.health.is_degraded() {
            return fallback_entry(&normalized);
        }

        // Backpressure: a saturated provider degrades to the fallback right
        // away instead of queueing the caller.
        let Ok(_permit) = self.permits.try_acquire() else {
            return fallback_entry(&normalized);
        };

        match self.fetch(&normalized).await {
            Ok(entry) => {
                self.health.record_success();
                self.cache.put(cache_key, entry.clone(), self.cache_ttl);
                entry
            }
            Err(error) => {
                self.health.record_failure();
                tracing::warn!(word = %normalized, %error, "Dictionary lookup failed");
                fallback_entry(&normalized)
            }
        }
    }

    async fn fetch(&self, word: &str) -> Result<DictionaryEntry, AdapterError> {
        let url = format!("{}/en/{}", self.base_url.trim_end_matches('/'), word);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Unavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let entries: Vec<WireEntry> = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;
        let first = entries
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::Malformed("empty entry list".to_string()))?;

        Ok(DictionaryEntry {
            word: first.word,
            phonetic: first.phonetic,
            meanings: first
                .meanings
                .into_iter()
                .map(|m| Meaning {
                    part_of_speech: m.part_of_speech,
                    definitions: m.definitions.into_iter().map(|d| d.definition).collect(),
                })
                .collect(),
            source: PROVIDER.to_string(),
        })
    }

    /// Cheap liveness check used by the probe worker.
    pub async fn probe(&self) {
        if self.mock {
            self.health.record_success();
            return;
        }
        match self.fetch("hello").await {
            Ok(_) => self.health.record_success(),
            Err(error) => {
                self.health.record_failure();
                tracing::debug!(%error, "Dictionary probe failed");
            }
        }
    }
}

pub fn fallback_entry(word: &str) -> DictionaryEntry {
    DictionaryEntry {
        word: word.to_string(),
        phonetic: None,
        meanings: Vec::new(),
        source: "fallback".to_string(),
    }
}

fn mock_entry(word: &str) -> DictionaryEntry {
    DictionaryEntry {
        word: word.to_string(),
        phonetic: Some(format!("/{word}/")),
        meanings: vec![Meaning {
            part_of_speech: "noun".to_string(),
            definitions: vec![format!("mock definition of {word}")],
        }],
        source: "mock".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> AdapterConfig {
        AdapterConfig {
            mock: true,
            dictionary_api_url: "http://127.0.0.1:9".to_string(),
            tts_api_url: String::new(),
            stt_api_url: String::new(),
            stt_api_key: String::new(),
            dictionary_timeout_secs: 1,
            tts_timeout_secs: 1,
            stt_timeout_secs: 1,
            dictionary_cache_ttl_secs: 3600,
            tts_cache_ttl_secs: 7200,
            max_concurrent_per_provider: 2,
        }
    }

    #[tokio::test]
    async fn mock_mode_returns_canned_entry_and_caches() {
        let adapter = DictionaryAdapter::new(&mock_config());

        let entry = adapter.lookup("  Hello ").await;
        assert_eq!(entry.word, "hello");
        assert_eq!(entry.source, "mock");
        assert_eq!(adapter.cache.len(), 1);

        // Case variants share the cache slot.
        adapter.lookup("HELLO").await;
        assert_eq!(adapter.cache.len(), 1);
    }

    #[tokio::test]
    async fn degraded_provider_serves_fallback() {
        let mut config = mock_config();
        config.mock = false;
        let adapter = DictionaryAdapter::new(&config);
        for _ in 0..3 {
            adapter.health.record_failure();
        }

        let entry = adapter.lookup("word").await;
        assert_eq!(entry.source, "fallback");
        assert!(entry.meanings.is_empty());
    }

    #[tokio::test]
    async fn saturated_provider_falls_back_without_waiting() {
        let mut config = mock_config();
        config.mock = false;
        config.max_concurrent_per_provider = 1;
        let adapter = DictionaryAdapter::new(&config);
        let _held = adapter.permits.try_acquire().unwrap();

        let entry = adapter.lookup("word").await;
        assert_eq!(entry.source, "fallback");
        // Backpressure is not a provider failure.
        assert_eq!(adapter.health.status().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back_and_counts_failure() {
        let mut config = mock_config();
        config.mock = false;
        let adapter = DictionaryAdapter::new(&config);

        let entry = adapter.lookup("word").await;
        assert_eq!(entry.source, "fallback");
        assert_eq!(adapter.health.status().consecutive_failures, 1);
    }
}
