use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::adapters::AdapterHub;
use crate::config::Config;
use crate::events::EventBus;
use crate::store::Store;

/// Shared application state handed to every route and worker.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub adapters: Arc<AdapterHub>,
    pub config: Arc<Config>,
    pub events: EventBus,
    pub shutdown_tx: broadcast::Sender<()>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let adapters = AdapterHub::new(&config.adapters);
        Self {
            store: Arc::new(store),
            adapters: Arc::new(adapters),
            config: Arc::new(config),
            events: EventBus::new(),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
