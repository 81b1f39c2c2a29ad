//! Channel registry — maps wire channel hashes to channels and dispatches
//! inbound frames.
//!
//! One registry per router instance. Channels are registered at startup
//! and never removed, so readers go through the map without taking a
//! lock. The registry is deliberately not a process-wide static: tests
//! run whole meshes of routers in one process.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use plexus_core::wire::{channel_hash, Envelope, FrameKind};
use plexus_core::PeerName;

use crate::channel::{ErasedChannel, GossipChannel};
use crate::gossiper::Gossiper;
use crate::routing::{Connection, Routing};

pub struct ChannelRegistry {
    ourself: PeerName,
    routes: Arc<dyn Routing>,
    channels: DashMap<u32, Arc<dyn ErasedChannel>>,
}

/// The one outbound failure that is a programmer error rather than a
/// routine routing miss.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("channel {name:?} hashes to {hash:#010x}, already taken by {existing:?}")]
    DuplicateChannel {
        name: String,
        existing: String,
        hash: u32,
    },
}

impl ChannelRegistry {
    pub fn new(ourself: PeerName, routes: Arc<dyn Routing>) -> Self {
        Self {
            ourself,
            routes,
            channels: DashMap::new(),
        }
    }

    pub fn local_peer(&self) -> PeerName {
        self.ourself
    }

    /// Register a gossiper under a channel name and get back the handle
    /// used to originate unicasts, broadcasts, and proactive gossip.
    ///
    /// Rejects a second registration whose name hashes to an occupied
    /// slot; same-name and hash-collision cases are both configuration
    /// errors.
    pub fn register<G: Gossiper>(
        &self,
        name: &str,
        gossiper: G,
    ) -> Result<Arc<GossipChannel<G>>, RegisterError> {
        let hash = channel_hash(name);
        match self.channels.entry(hash) {
            Entry::Occupied(entry) => Err(RegisterError::DuplicateChannel {
                name: name.to_string(),
                existing: entry.get().name().to_string(),
                hash,
            }),
            Entry::Vacant(entry) => {
                let channel = Arc::new(GossipChannel::new(
                    name,
                    hash,
                    self.ourself,
                    gossiper,
                    self.routes.clone(),
                ));
                entry.insert(channel.clone());
                tracing::debug!(channel = name, hash, "gossip channel registered");
                Ok(channel)
            }
        }
    }

    /// Inbound entry point: the transport hands over a frame with its
    /// kind tag. Every failure mode here drops the frame and keeps the
    /// connection; remote input never panics this layer.
    pub fn handle_frame(&self, kind: FrameKind, frame: &[u8]) {
        let envelope = match Envelope::decode(kind, frame) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(?kind, %error, "dropping malformed gossip frame");
                return;
            }
        };
        let Some(channel) = self
            .channels
            .get(&envelope.channel_hash())
            .map(|entry| entry.value().clone())
        else {
            tracing::warn!(
                channel_hash = envelope.channel_hash(),
                src = %envelope.src(),
                "dropping frame for a channel we do not run"
            );
            return;
        };
        let result = match &envelope {
            Envelope::Gossip { src, payload, .. } => channel.deliver_gossip(*src, payload),
            Envelope::Broadcast { src, payload, .. } => {
                channel.deliver_broadcast(*src, frame, payload)
            }
            Envelope::Unicast {
                src, dst, payload, ..
            } => channel.deliver_unicast(*src, *dst, frame, payload),
        };
        if let Err(error) = result {
            tracing::warn!(
                channel = channel.name(),
                src = %envelope.src(),
                %error,
                "gossiper failed to handle frame, dropping"
            );
        }
    }

    /// One gossip round: every channel sends its gossiper's full local
    /// state to every neighbor.
    pub fn send_all_gossip(&self) {
        for channel in self.channels.iter() {
            channel.gossip_local_state();
        }
    }

    /// Push every channel's current state down one connection. Called by
    /// the routing layer when a new connection is established, so the new
    /// neighbor converges without waiting a full gossip interval.
    pub fn send_all_gossip_down(&self, conn: &Arc<dyn Connection>) {
        for channel in self.channels.iter() {
            channel.gossip_local_state_down(conn);
        }
    }
}
