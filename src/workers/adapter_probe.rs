//! Liveness probe for external providers. Degraded providers only recover
//! through a successful call, and with traffic routed to fallbacks the probe
//! is the one caller that still reaches the real upstream.

use crate::state::AppState;
use crate::store::StoreError;

pub async fn run(state: &AppState) -> Result<(), StoreError> {
    let adapters = &state.adapters;
    tokio::join!(
        adapters.dictionary.probe(),
        adapters.tts.probe(),
        adapters.stt.probe(),
    );

    for status in adapters.statuses() {
        if status.degraded {
            tracing::warn!(provider = status.name, "Provider still degraded after probe");
        }
    }
    Ok(())
}
