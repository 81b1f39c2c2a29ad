//! Gossiper contract — what a channel's application layer must provide.
//!
//! The core is parametric over the payload: it never inspects state, it
//! only encodes, merges, and routes it. Intentionally minimal; anything
//! like request/response is an application concern built on top.

use anyhow::Result;
use plexus_core::PeerName;

/// Application state that can be accumulated in a sender's pending slot.
///
/// `encode` must be pure and deterministic for a given state. `merge` must
/// produce a state at least as recent as each input; when the underlying
/// state is a join-semilattice the core additionally gets commutativity and
/// idempotence for free, which keeps coalescing loss-free.
pub trait GossipData: Clone + Send + Sync + 'static {
    fn encode(&self) -> Vec<u8>;

    /// Combine `other` into `self`.
    fn merge(&mut self, other: Self);
}

/// The application component behind one gossip channel.
///
/// The core calls these hooks concurrently from distinct tasks; a gossiper
/// is responsible for its own internal synchronization. Hook errors are
/// logged by the dispatcher and the offending frame dropped — they never
/// tear down a connection.
pub trait Gossiper: Send + Sync + 'static {
    type Data: GossipData;

    /// Snapshot of everything this gossiper knows. Called once per gossip
    /// interval, and when a new connection needs the full state pushed down.
    fn local_state(&self) -> Self::Data;

    /// Merge remote state into local state. Returns the delta of newly
    /// learned state, or `None` if everything in `payload` was already
    /// known. A `None` return is what terminates the epidemic.
    fn on_gossip(&self, payload: &[u8]) -> Result<Option<Self::Data>>;

    /// A broadcast payload reached this peer. Called exactly once per frame
    /// reception, independent of onward fan-out.
    fn on_broadcast(&self, payload: &[u8]) -> Result<()>;

    /// A unicast payload addressed to this peer arrived. `src` is the
    /// originating peer, not the forwarding neighbor.
    fn on_unicast(&self, src: PeerName, payload: &[u8]) -> Result<()>;
}
