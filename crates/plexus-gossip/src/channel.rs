//! Gossip channel — one named topic, one gossiper, one sender per live
//! connection.
//!
//! The channel mutex guards only the senders map and sender creation.
//! Connection enumeration and routing queries run outside it (the routing
//! layer takes its own locks, and those are always ordered before ours),
//! and payload encoding runs inside the sender worker, never under either
//! mutex.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use parking_lot::Mutex;
use plexus_core::wire::{Envelope, FrameKind};
use plexus_core::PeerName;

use crate::gossiper::Gossiper;
use crate::routing::{Connection, ConnectionId, Routing};
use crate::sender::GossipSender;

pub struct GossipChannel<G: Gossiper> {
    name: Arc<str>,
    hash: u32,
    ourself: PeerName,
    gossiper: G,
    routes: Arc<dyn Routing>,
    senders: Mutex<HashMap<ConnectionId, GossipSender<G::Data>>>,
}

impl<G: Gossiper> std::fmt::Debug for GossipChannel<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GossipChannel")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .finish()
    }
}

impl<G: Gossiper> GossipChannel<G> {
    pub(crate) fn new(
        name: &str,
        hash: u32,
        ourself: PeerName,
        gossiper: G,
        routes: Arc<dyn Routing>,
    ) -> Self {
        Self {
            name: name.into(),
            hash,
            ourself,
            gossiper,
            routes,
            senders: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The channel's wire identifier.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn gossiper(&self) -> &G {
        &self.gossiper
    }

    /// Number of live per-connection senders. Senders for dropped
    /// connections linger until the next `send_gossip` cycle reaps them.
    pub fn sender_count(&self) -> usize {
        self.senders.lock().len()
    }

    /// Fan `data` out to every current connection, then reap senders whose
    /// connection is gone.
    pub fn send_gossip(&self, data: G::Data) {
        let connections = self.routes.local_connections();
        {
            let mut senders = self.senders.lock();
            for conn in &connections {
                self.sender_down(&mut senders, conn).send(data.clone());
            }
        }
        self.garbage_collect_senders();
    }

    /// Targeted push to a single connection, used when a new link comes up
    /// and the peer on the other end needs our full state without waiting
    /// for the next gossip round.
    pub fn send_gossip_down(&self, conn: &Arc<dyn Connection>, data: G::Data) {
        let mut senders = self.senders.lock();
        self.sender_down(&mut senders, conn).send(data);
    }

    fn sender_down<'a>(
        &self,
        senders: &'a mut HashMap<ConnectionId, GossipSender<G::Data>>,
        conn: &Arc<dyn Connection>,
    ) -> &'a GossipSender<G::Data> {
        senders.entry(conn.identity()).or_insert_with(|| {
            GossipSender::start(self.name.clone(), self.hash, self.ourself, conn.clone())
        })
    }

    /// Keep senders matching current connections, stop the rest. Runs
    /// opportunistically after every `send_gossip`; combined with the
    /// periodic driver this bounds a dead sender's lifetime to one gossip
    /// interval.
    pub(crate) fn garbage_collect_senders(&self) {
        let live: HashSet<ConnectionId> = self
            .routes
            .local_connections()
            .iter()
            .map(|c| c.identity())
            .collect();
        let stopped: Vec<(ConnectionId, GossipSender<G::Data>)> = {
            let mut senders = self.senders.lock();
            let dead: Vec<ConnectionId> = senders
                .keys()
                .filter(|id| !live.contains(id))
                .copied()
                .collect();
            dead.into_iter()
                .filter_map(|id| senders.remove(&id).map(|s| (id, s)))
                .collect()
        };
        for (id, sender) in stopped {
            tracing::debug!(channel = %self.name, conn = ?id, "stopping sender for dropped connection");
            sender.stop();
        }
    }

    /// Send `payload` to `dst`, relayed hop by hop along the unicast
    /// topology. Best-effort: a missing route drops the payload.
    pub fn gossip_unicast(&self, dst: PeerName, payload: Bytes) -> Result<()> {
        let envelope = Envelope::Unicast {
            channel_hash: self.hash,
            src: self.ourself,
            dst,
            payload,
        };
        self.relay_unicast(dst, envelope.encode());
        Ok(())
    }

    /// Send `payload` to every peer, relayed along the broadcast tree
    /// rooted at the local peer.
    pub fn gossip_broadcast(&self, payload: Bytes) -> Result<()> {
        let envelope = Envelope::Broadcast {
            channel_hash: self.hash,
            src: self.ourself,
            payload,
        };
        self.relay_broadcast(self.ourself, envelope.encode());
        Ok(())
    }

    fn relay_unicast(&self, dst: PeerName, frame: Bytes) {
        let Some(conn) = self.routes.unicast_next_hop(dst) else {
            tracing::debug!(channel = %self.name, %dst, "no route towards destination, dropping unicast");
            return;
        };
        if let Err(error) = conn.send_frame(FrameKind::GossipUnicast, frame) {
            tracing::debug!(
                channel = %self.name,
                %dst,
                peer = %conn.remote_peer(),
                %error,
                "unicast relay failed, dropping"
            );
        }
    }

    fn relay_broadcast(&self, src: PeerName, frame: Bytes) {
        for conn in self.routes.broadcast_hops(src) {
            if let Err(error) = conn.send_frame(FrameKind::GossipBroadcast, frame.clone()) {
                tracing::debug!(
                    channel = %self.name,
                    %src,
                    peer = %conn.remote_peer(),
                    %error,
                    "broadcast relay failed, dropping"
                );
            }
        }
    }
}

/// Object-safe face of a channel, so the registry can hold channels whose
/// gossipers have different payload types.
pub(crate) trait ErasedChannel: Send + Sync {
    fn name(&self) -> &str;

    fn deliver_gossip(&self, src: PeerName, payload: &[u8]) -> Result<()>;

    fn deliver_broadcast(&self, src: PeerName, frame: &[u8], payload: &[u8]) -> Result<()>;

    fn deliver_unicast(
        &self,
        src: PeerName,
        dst: PeerName,
        frame: &[u8],
        payload: &[u8],
    ) -> Result<()>;

    fn gossip_local_state(&self);

    fn gossip_local_state_down(&self, conn: &Arc<dyn Connection>);
}

impl<G: Gossiper> ErasedChannel for GossipChannel<G> {
    fn name(&self) -> &str {
        GossipChannel::name(self)
    }

    fn deliver_gossip(&self, _src: PeerName, payload: &[u8]) -> Result<()> {
        if let Some(delta) = self.gossiper.on_gossip(payload)? {
            // Epidemic fan-out: what we just learned goes to every
            // neighbor, no routing involved.
            self.send_gossip(delta);
        }
        Ok(())
    }

    fn deliver_broadcast(&self, src: PeerName, frame: &[u8], payload: &[u8]) -> Result<()> {
        self.gossiper.on_broadcast(payload)?;
        // Relay the original envelope unchanged; src stays authoritative
        // for spanning-tree construction at the next hop.
        self.relay_broadcast(src, Bytes::copy_from_slice(frame));
        Ok(())
    }

    fn deliver_unicast(
        &self,
        src: PeerName,
        dst: PeerName,
        frame: &[u8],
        payload: &[u8],
    ) -> Result<()> {
        if dst == self.ourself {
            self.gossiper.on_unicast(src, payload)
        } else {
            self.relay_unicast(dst, Bytes::copy_from_slice(frame));
            Ok(())
        }
    }

    fn gossip_local_state(&self) {
        self.send_gossip(self.gossiper.local_state());
    }

    fn gossip_local_state_down(&self, conn: &Arc<dyn Connection>) {
        self.send_gossip_down(conn, self.gossiper.local_state());
    }
}
