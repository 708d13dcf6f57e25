//! Evicts expired adapter cache entries.

use crate::state::AppState;
use crate::store::StoreError;

pub async fn run(state: &AppState) -> Result<(), StoreError> {
    let purged = state.adapters.purge_caches();
    if purged > 0 {
        tracing::debug!(purged, "Purged expired adapter cache entries");
    }
    Ok(())
}
