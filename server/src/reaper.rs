use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::SyncEngine;

/// Periodically drops sessions that have been member-less for `ttl`.
pub fn spawn_reaper(engine: Arc<SyncEngine>, ttl: Duration, every: Duration) -> JoinHandle<()> {
    info!(ttl_secs = ttl.as_secs(), "idle session reclamation enabled");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let reaped = engine.reap_idle(ttl, Instant::now());
            if !reaped.is_empty() {
                info!(
                    reaped = reaped.len(),
                    remaining = engine.store().len(),
                    "reaper pass"
                );
            }
        }
    })
}
