//! Multi-peer gossip scenarios over an in-memory mesh.


mod convergence;
mod lifecycle;
mod relay;
