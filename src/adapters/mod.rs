//! External providers behind a uniform seam: dictionary lookups, speech
//! synthesis, and speech recognition.
//!
//! Every provider call goes through the same guard rails: a concurrency
//! semaphore, a per-call timeout on the HTTP client, a consecutive-failure
//! circuit, and a deterministic fallback tagged `source = "fallback"` so
//! callers and clients can tell degraded output apart from the real thing.

pub mod cache;
pub mod dictionary;
pub mod stt;
pub mod tts;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::AdapterConfig;
use crate::constants::DEGRADE_AFTER_FAILURES;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Network failure, timeout, non-2xx status, or an open circuit.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered but the payload did not parse.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Circuit state for one provider. Providers start out unproven; a success
/// marks them ready, and `DEGRADE_AFTER_FAILURES` consecutive failures trip
/// the circuit until the next successful call or probe.
#[derive(Debug)]
pub struct ProviderHealth {
    name: &'static str,
    ready: AtomicBool,
    degraded: AtomicBool,
    consecutive_failures: AtomicU32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: &'static str,
    pub ready: bool,
    pub degraded: bool,
    pub consecutive_failures: u32,
}

impl ProviderHealth {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ready: AtomicBool::new(false),
            degraded: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.ready.store(true, Ordering::Relaxed);
        if self.degraded.swap(false, Ordering::Relaxed) {
            tracing::info!(provider = self.name, "Provider recovered");
        }
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= DEGRADE_AFTER_FAILURES && !self.degraded.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                provider = self.name,
                failures,
                "Provider degraded, serving fallbacks"
            );
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> ProviderStatus {
        ProviderStatus {
            name: self.name,
            ready: self.ready.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
        }
    }
}

/// All external providers plus their shared configuration.
#[derive(Debug)]
pub struct AdapterHub {
    pub dictionary: dictionary::DictionaryAdapter,
    pub tts: tts::TtsAdapter,
    pub stt: stt::SttAdapter,
}

impl AdapterHub {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            dictionary: dictionary::DictionaryAdapter::new(config),
            tts: tts::TtsAdapter::new(config),
            stt: stt::SttAdapter::new(config),
        }
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        vec![
            self.dictionary.health.status(),
            self.tts.health.status(),
            self.stt.health.status(),
        ]
    }

    /// Clears expired cache entries across all providers.
    pub fn purge_caches(&self) -> usize {
        self.dictionary.cache.purge_expired() + self.tts.cache.purge_expired()
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

pub(crate) fn new_semaphore(permits: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(permits.max(1)))
}
