//! Session retention policy and background pruning.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use webs_core::traits::SessionStore;

/// Configuration for session retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Sessions idle longer than this are removed.
    pub max_idle: Duration,
    /// How often the pruner runs.
    pub interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_idle: Duration::from_secs(24 * 60 * 60),
            interval: Duration::from_secs(300),
        }
    }
}

/// Spawn a task that prunes idle sessions until `shutdown` flips to true
/// or its sender is dropped.
pub fn spawn_pruner(
    store: Arc<dyn SessionStore>,
    policy: RetentionPolicy,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.interval);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.prune(policy.max_idle).await {
                        Ok(removed) => tracing::debug!(
                            removed = removed,
                            live = store.len(),
                            "Session retention pass"
                        ),
                        Err(e) => tracing::warn!(error = %e, "Session pruning failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Session pruner stopping");
                        break;
                    }
                }
            }
        }
    })
}
