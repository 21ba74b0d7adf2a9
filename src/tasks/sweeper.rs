//! Expiry Sweeper Task
//!
//! Background task that periodically purges expired documents.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a task that calls [`MemoryStore::purge_expired`] every `interval`.
///
/// Expired documents are already invisible to reads; the sweep only bounds
/// memory held by documents nobody reads again. Abort the returned handle on
/// shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(MemoryStore::new());
/// let sweeper = spawn_expiry_sweeper(store.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_expiry_sweeper(store: Arc<MemoryStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "starting expiry sweeper");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired().await;
            if removed > 0 {
                info!(removed, "expiry sweep removed documents");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}
