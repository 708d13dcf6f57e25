use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use tempfile::TempDir;

use vocab_backend::config::{AdapterConfig, Config, WorkerConfig};
use vocab_backend::routes::build_router;
use vocab_backend::state::AppState;
use vocab_backend::store::Store;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub fn test_config() -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log_level: "warn".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: String::new(),
        cors_origin: "*".to_string(),
        worker: WorkerConfig {
            is_leader: false,
            enable_adapter_probe: false,
        },
        adapters: AdapterConfig {
            mock: true,
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
        },
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let store = Store::open(dir.path().join("db").to_str().expect("utf8 path")).expect("open store");
    store.run_migrations().expect("migrations");

    let state = AppState::new(store, config);
    let router = build_router(state.clone());

    TestApp {
        router,
        state,
        _dir: dir,
    }
}
