//! Speech-to-text recognition. Uncached: audio payloads are effectively
//! unique, so a cache would only hold memory hostage.

use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::config::AdapterConfig;

use super::{build_client, new_semaphore, AdapterError, ProviderHealth};

const PROVIDER: &str = "stt";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    /// Recognizer confidence in [0, 1].
    pub confidence: f64,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    audio_base64: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug)]
pub struct SttAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    mock: bool,
    pub health: ProviderHealth,
    permits: Arc<Semaphore>,
}

impl SttAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            client: build_client(config.stt_timeout_secs),
            api_url: config.stt_api_url.clone(),
            api_key: config.stt_api_key.clone(),
            mock: config.mock,
            health: ProviderHealth::new(PROVIDER),
            permits: new_semaphore(config.max_concurrent_per_provider),
        }
    }

    /// Transcribes base64-encoded audio. In mock mode the audio bytes are
    /// interpreted as UTF-8 and echoed back, which gives tests full control
    /// over the recognized text.
    pub async fn transcribe(
        &self,
        audio_base64: &str,
        language: &str,
    ) -> Result<Transcription, AdapterError> {
        if self.mock {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(audio_base64)
                .map_err(|e| AdapterError::Malformed(e.to_string()))?;
            let text = String::from_utf8(bytes)
                .map_err(|e| AdapterError::Malformed(e.to_string()))?;
            self.health.record_success();
            return Ok(Transcription {
                text,
                confidence: 0.92,
                source: "mock".to_string(),
            });
        }

        if self.api_url.is_empty() {
            return Err(AdapterError::Unavailable(
                "no STT provider configured".to_string(),
            ));
        }
        if self.health.is_degraded() {
            return Err(AdapterError::Unavailable("provider degraded".to_string()));
        }

        // Saturation surfaces as unavailability at once; waiting for a permit
        // would stack recordings behind a slow provider.
        let Ok(_permit) = self.permits.try_acquire() else {
            return Err(AdapterError::Unavailable(
                "provider at capacity".to_string(),
            ));
        };

        match self.fetch(audio_base64, language).await {
            Ok(t) => {
                self.health.record_success();
                Ok(t)
            }
            Err(error) => {
                self.health.record_failure();
                Err(error)
            }
        }
    }

    async fn fetch(
        &self,
        audio_base64: &str,
        language: &str,
    ) -> Result<Transcription, AdapterError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&WireRequest {
                audio_base64,
                language,
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

        Ok(Transcription {
            text: wire.text,
            confidence: wire.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            source: PROVIDER.to_string(),
        })
    }

    pub async fn probe(&self) {
        if self.mock || self.api_url.is_empty() {
            if self.mock {
                self.health.record_success();
            }
            return;
        }
        // An empty payload still exercises auth, routing, and timeouts.
        match self.fetch("", "en-US").await {
            Ok(_) => self.health.record_success(),
            Err(error) => {
                self.health.record_failure();
                tracing::debug!(%error, "STT probe failed");
            }
        }
    }
}
