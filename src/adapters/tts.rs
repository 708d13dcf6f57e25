//! Text-to-speech synthesis. Results are cached for 2 hours keyed on a hash
//! of (text, language, voice); the fallback tells the client to use its own
//! speech synthesis instead of shipping audio.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;

use crate::config::AdapterConfig;

use super::cache::TtlCache;
use super::{build_client, new_semaphore, AdapterError, ProviderHealth};

const PROVIDER: &str = "tts";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAudio {
    pub text: String,
    pub language: String,
    pub voice: String,
    /// "audio" carries base64 MP3 in `audio_base64`; "browser" tells the
    /// client to synthesize locally.
    pub strategy: String,
    pub audio_base64: Option<String>,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    text: &'a str,
    language: &'a str,
    voice: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    audio_base64: String,
}

#[derive(Debug)]
pub struct TtsAdapter {
    client: reqwest::Client,
    api_url: String,
    mock: bool,
    cache_ttl: Duration,
    pub cache: TtlCache<SpeechAudio>,
    pub health: ProviderHealth,
    permits: Arc<Semaphore>,
}

pub fn cache_key(text: &str, language: &str, voice: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(language.as_bytes());
    hasher.update(b"|");
    hasher.update(voice.as_bytes());
    format!("{PROVIDER}:{}", hex::encode(hasher.finalize()))
}

impl TtsAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            client: build_client(config.tts_timeout_secs),
            api_url: config.tts_api_url.clone(),
            mock: config.mock,
            cache_ttl: Duration::from_secs(config.tts_cache_ttl_secs),
            cache: TtlCache::new(),
            health: ProviderHealth::new(PROVIDER),
            permits: new_semaphore(config.max_concurrent_per_provider),
        }
    }

    pub async fn synthesize(&self, text: &str, language: &str, voice: &str) -> SpeechAudio {
        let key = cache_key(text, language, voice);
        if let Some(audio) = self.cache.get(&key) {
            return audio;
        }

        if self.mock {
            let audio = SpeechAudio {
                text: text.to_string(),
                language: language.to_string(),
                voice: voice.to_string(),
                strategy: "audio".to_string(),
                audio_base64: Some(
                    base64::engine::general_purpose::STANDARD.encode(b"mock-audio"),
                ),
                source: "mock".to_string(),
            };
            self.cache.put(key, audio.clone(), self.cache_ttl);
            return audio;
        }

        // No configured upstream behaves like a degraded one.
        if self.api_url.is_empty() || self.health.is_degraded() {
            return browser_fallback(text, language, voice);
        }

        // Saturation falls back immediately rather than queueing the caller.
        let Ok(_permit) = self.permits.try_acquire() else {
            return browser_fallback(text, language, voice);
        };

        match self.fetch(text, language, voice).await {
            Ok(audio) => {
                self.health.record_success();
                self.cache.put(key, audio.clone(), self.cache_ttl);
                audio
            }
            Err(error) => {
                self.health.record_failure();
                tracing::warn!(%error, "TTS synthesis failed");
                browser_fallback(text, language, voice)
            }
        }
    }

    async fn fetch(
        &self,
        text: &str,
        language: &str,
        voice: &str,
    ) -> Result<SpeechAudio, AdapterError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&WireRequest {
                text,
                language,
                voice,
            })
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Unavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;

        Ok(SpeechAudio {
            text: text.to_string(),
            language: language.to_string(),
            voice: voice.to_string(),
            strategy: "audio".to_string(),
            audio_base64: Some(wire.audio_base64),
            source: PROVIDER.to_string(),
        })
    }

    pub async fn probe(&self) {
        if self.mock {
            self.health.record_success();
            return;
        }
        if self.api_url.is_empty() {
            return;
        }
        match self.fetch("ping", "en-US", "default").await {
            Ok(_) => self.health.record_success(),
            Err(error) => {
                self.health.record_failure();
                tracing::debug!(%error, "TTS probe failed");
            }
        }
    }
}

pub fn browser_fallback(text: &str, language: &str, voice: &str) -> SpeechAudio {
    SpeechAudio {
        text: text.to_string(),
        language: language.to_string(),
        voice: voice.to_string(),
        strategy: "browser".to_string(),
        audio_base64: None,
        source: "fallback".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config(mock: bool) -> AdapterConfig {
        AdapterConfig {
            mock,
            dictionary_api_url: String::new(),
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

    #[test]
    fn cache_key_depends_on_all_inputs() {
        let base = cache_key("hello", "en-US", "default");
        assert_ne!(base, cache_key("hello!", "en-US", "default"));
        assert_ne!(base, cache_key("hello", "en-GB", "default"));
        assert_ne!(base, cache_key("hello", "en-US", "alto"));
        assert_eq!(base, cache_key("hello", "en-US", "default"));
    }

    #[tokio::test]
    async fn mock_mode_returns_audio_and_caches() {
        let adapter = TtsAdapter::new(&mock_config(true));

        let audio = adapter.synthesize("hello", "en-US", "default").await;
        assert_eq!(audio.strategy, "audio");
        assert_eq!(audio.source, "mock");
        assert!(audio.audio_base64.is_some());
        assert_eq!(adapter.cache.len(), 1);
    }

    #[tokio::test]
    async fn saturated_provider_yields_browser_fallback_without_waiting() {
        let mut config = mock_config(false);
        config.tts_api_url = "http://127.0.0.1:9".to_string();
        config.max_concurrent_per_provider = 1;
        let adapter = TtsAdapter::new(&config);
        let _held = adapter.permits.try_acquire().unwrap();

        let audio = adapter.synthesize("hello", "en-US", "default").await;
        assert_eq!(audio.strategy, "browser");
        assert_eq!(audio.source, "fallback");
        assert_eq!(adapter.health.status().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn unconfigured_upstream_yields_browser_fallback() {
        let adapter = TtsAdapter::new(&mock_config(false));

        let audio = adapter.synthesize("hello", "en-US", "default").await;
        assert_eq!(audio.strategy, "browser");
        assert_eq!(audio.source, "fallback");
        assert!(audio.audio_base64.is_none());
    }
}
