//! plexus-gossip — state dissemination across the overlay mesh.
//!
//! Three delivery modes, all multiplexed over named channels:
//!
//! - **Periodic epidemic merge.** Every gossip interval each channel sends
//!   its gossiper's full local state to every neighbor. Receivers merge it
//!   and re-gossip only what they learned, so updates spread to all
//!   reachable peers and the epidemic terminates once everyone knows
//!   everything.
//! - **Unicast relay.** A payload addressed to one peer, forwarded hop by
//!   hop along the routing layer's best path.
//! - **Spanning-tree broadcast.** A payload delivered once to every peer,
//!   relayed along the broadcast tree rooted at the original sender.
//!
//! The registry is scoped to one router instance — no ambient statics —
//! so several routers can coexist in a single process, which is how the
//! integration tests build whole meshes in memory.

pub mod channel;
pub mod driver;
pub mod gossiper;
pub mod registry;
pub mod routing;
mod sender;

pub use channel::GossipChannel;
pub use gossiper::{GossipData, Gossiper};
pub use registry::{ChannelRegistry, RegisterError};
pub use routing::{Connection, ConnectionId, Routing};
