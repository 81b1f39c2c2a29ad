//! Per-(channel, connection) coalescing sender.
//!
//! Accumulates state that needs to go to one neighbor and sends it when
//! the worker gets scheduled. Multiple enqueues between flushes merge into
//! a single pending value, so outbound work per connection is bounded at
//! one frame per wake regardless of the enqueue rate. The merge operation
//! is the only back-pressure at this layer.

use std::sync::Arc;

use parking_lot::Mutex;
use plexus_core::wire::{Envelope, FrameKind};
use plexus_core::PeerName;
use tokio::sync::mpsc;

use crate::gossiper::GossipData;
use crate::routing::Connection;

pub(crate) struct GossipSender<D: GossipData> {
    shared: Arc<Shared<D>>,
    wake: mpsc::Sender<()>,
}

struct Shared<D> {
    pending: Mutex<Option<D>>,
}

impl<D: GossipData> GossipSender<D> {
    /// Create the sender and spawn its worker task.
    pub(crate) fn start(
        channel: Arc<str>,
        channel_hash: u32,
        ourself: PeerName,
        conn: Arc<dyn Connection>,
    ) -> Self {
        // Capacity one: a wake already in flight is sufficient.
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let shared = Arc::new(Shared {
            pending: Mutex::new(None),
        });
        tokio::spawn(run(
            shared.clone(),
            wake_rx,
            channel,
            channel_hash,
            ourself,
            conn,
        ));
        GossipSender {
            shared,
            wake: wake_tx,
        }
    }

    /// Merge `data` into the pending slot and nudge the worker.
    pub(crate) fn send(&self, data: D) {
        {
            let mut pending = self.shared.pending.lock();
            match pending.as_mut() {
                Some(current) => current.merge(data),
                None => *pending = Some(data),
            }
        }
        let _ = self.wake.try_send(());
    }

    /// Close the wake channel. The worker finishes any wake already in
    /// flight and exits; pending state is not otherwise flushed.
    pub(crate) fn stop(self) {}
}

async fn run<D: GossipData>(
    shared: Arc<Shared<D>>,
    mut wake: mpsc::Receiver<()>,
    channel: Arc<str>,
    channel_hash: u32,
    ourself: PeerName,
    conn: Arc<dyn Connection>,
) {
    while wake.recv().await.is_some() {
        let pending = shared.pending.lock().take();
        let Some(data) = pending else { continue };
        // Encode after releasing the lock: encode may take application
        // locks of its own.
        let envelope = Envelope::Gossip {
            channel_hash,
            src: ourself,
            payload: data.encode().into(),
        };
        if let Err(error) = conn.send_frame(FrameKind::Gossip, envelope.encode()) {
            tracing::debug!(
                channel = %channel,
                peer = %conn.remote_peer(),
                %error,
                "gossip send failed, sender worker exiting"
            );
            return;
        }
    }
    tracing::trace!(channel = %channel, peer = %conn.remote_peer(), "gossip sender stopped");
}
