//! Routing-layer contract consumed by the gossip core.
//!
//! The topology/routing layer owns connection lifecycle and path
//! computation; gossip only asks three questions of it. Implementations
//! may take their own locks inside these calls, so the gossip core never
//! invokes them while holding a channel mutex.

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use plexus_core::wire::FrameKind;
use plexus_core::PeerName;

/// Stable identity of a connection, valid for its lifetime. Two
/// connections to the same remote peer (e.g. across a reconnect) have
/// distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// A live link to an adjacent peer, as exposed by the transport.
///
/// Assumed reliable and in-order per connection. `send_frame` failing is
/// treated as the connection dying; the routing layer will drop it and
/// sender garbage collection reaps the rest.
pub trait Connection: Send + Sync {
    fn identity(&self) -> ConnectionId;

    fn remote_peer(&self) -> PeerName;

    /// Hand a framed message to the transport, tagged with its kind byte.
    fn send_frame(&self, kind: FrameKind, frame: Bytes) -> Result<()>;
}

/// Next-hop queries answered by the routing layer.
pub trait Routing: Send + Sync {
    /// Current live connections of the local peer.
    fn local_connections(&self) -> Vec<Arc<dyn Connection>>;

    /// The connection on the best path towards `dst`, or `None` when the
    /// destination is unknown or unreachable.
    fn unicast_next_hop(&self, dst: PeerName) -> Option<Arc<dyn Connection>>;

    /// The connections to relay a broadcast over, for the spanning tree
    /// rooted at `src`. Empty when the local peer is a leaf of that tree.
    fn broadcast_hops(&self, src: PeerName) -> Vec<Arc<dyn Connection>>;
}
