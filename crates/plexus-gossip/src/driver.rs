//! Periodic gossip driver.
//!
//! One task per router. Each tick fires a full gossip round across every
//! registered channel; the round itself is idempotent, so there is no
//! per-tick cancellation. Connection establishment is handled separately:
//! the routing layer calls `ChannelRegistry::send_all_gossip_down` for the
//! new connection, so a fresh neighbor converges immediately rather than
//! after up to one interval.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::registry::ChannelRegistry;

/// Fire `send_all_gossip` every `interval` until `shutdown` signals.
pub async fn gossip_loop(
    registry: Arc<ChannelRegistry>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    tracing::info!(?interval, "gossip driver starting");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("gossip driver shutting down");
                return Ok(());
            }

            _ = ticker.tick() => {
                registry.send_all_gossip();
            }
        }
    }
}
