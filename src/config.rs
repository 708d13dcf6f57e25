use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants;

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub worker: WorkerConfig,
    pub adapters: AdapterConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    pub enable_adapter_probe: bool,
}

#[derive(Clone)]
pub struct AdapterConfig {
    /// Mock mode short-circuits all providers with canned output; used by
    /// tests and local development without network access.
    pub mock: bool,
    pub dictionary_api_url: String,
    pub tts_api_url: String,
    pub stt_api_url: String,
    pub stt_api_key: String,
    pub dictionary_timeout_secs: u64,
    pub tts_timeout_secs: u64,
    pub stt_timeout_secs: u64,
    pub dictionary_cache_ttl_secs: u64,
    pub tts_cache_ttl_secs: u64,
    pub max_concurrent_per_provider: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("cors_origin", &self.cors_origin)
            .field("worker", &self.worker)
            .field("adapters", &self.adapters)
            .finish()
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("mock", &self.mock)
            .field("dictionary_api_url", &self.dictionary_api_url)
            .field("tts_api_url", &self.tts_api_url)
            .field("stt_api_url", &self.stt_api_url)
            .field("stt_api_key", &"***REDACTED***")
            .field("dictionary_timeout_secs", &self.dictionary_timeout_secs)
            .field("tts_timeout_secs", &self.tts_timeout_secs)
            .field("stt_timeout_secs", &self.stt_timeout_secs)
            .field("dictionary_cache_ttl_secs", &self.dictionary_cache_ttl_secs)
            .field("tts_cache_ttl_secs", &self.tts_cache_ttl_secs)
            .field(
                "max_concurrent_per_provider",
                &self.max_concurrent_per_provider,
            )
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/vocab.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", true),
                enable_adapter_probe: env_or_bool("ENABLE_ADAPTER_PROBE_WORKER", true),
            },
            adapters: AdapterConfig {
                mock: env_or_bool("ADAPTERS_MOCK", true),
                dictionary_api_url: env_or(
                    "DICTIONARY_API_URL",
                    "https://api.dictionaryapi.dev/api/v2/entries",
                ),
                tts_api_url: env_or("TTS_API_URL", ""),
                stt_api_url: env_or("STT_API_URL", ""),
                stt_api_key: env_or("STT_API_KEY", ""),
                dictionary_timeout_secs: env_or_parse(
                    "DICTIONARY_TIMEOUT_SECS",
                    constants::DICTIONARY_TIMEOUT_SECS,
                ),
                tts_timeout_secs: env_or_parse("TTS_TIMEOUT_SECS", constants::TTS_TIMEOUT_SECS),
                stt_timeout_secs: env_or_parse("STT_TIMEOUT_SECS", constants::STT_TIMEOUT_SECS),
                dictionary_cache_ttl_secs: env_or_parse(
                    "DICTIONARY_CACHE_TTL_SECS",
                    constants::DICTIONARY_CACHE_TTL_SECS,
                ),
                tts_cache_ttl_secs: env_or_parse(
                    "TTS_CACHE_TTL_SECS",
                    constants::TTS_CACHE_TTL_SECS,
                ),
                max_concurrent_per_provider: env_or_parse("ADAPTER_MAX_CONCURRENT", 4_usize),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "HOST",
            "PORT",
            "RUST_LOG",
            "ADAPTERS_MOCK",
            "STT_TIMEOUT_SECS",
            "ADAPTER_MAX_CONCURRENT",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.adapters.mock);
        assert_eq!(cfg.adapters.stt_timeout_secs, 30);
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "4000");
        env::set_var("STT_TIMEOUT_SECS", "42");
        env::set_var("ADAPTER_MAX_CONCURRENT", "8");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.adapters.stt_timeout_secs, 42);
        assert_eq!(cfg.adapters.max_concurrent_per_provider, 8);
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        clear_keys(managed_keys());
    }

    #[test]
    fn debug_redacts_secrets() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("STT_API_KEY", "super-secret");
        let cfg = Config::from_env();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("super-secret"));
        env::remove_var("STT_API_KEY");
    }
}
