//! Peer identity.
//!
//! A peer is named by a 48-bit MAC-like value. Names are compared by value,
//! rendered in the usual six-octet colon form, and travel on the wire as a
//! fixed big-endian u64 (the upper 16 bits are zero for names parsed from
//! text, but any 64-bit value received from the wire is accepted as opaque).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a peer in the overlay.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct PeerName(u64);

impl PeerName {
    /// Reconstruct a name from its wire representation.
    pub fn from_bits(bits: u64) -> Self {
        PeerName(bits)
    }

    /// The wire representation: a fixed 64-bit value.
    pub fn bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0.to_be_bytes();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid peer name {0:?}: expected six colon-separated hex octets")]
pub struct PeerNameError(String);

impl FromStr for PeerName {
    type Err = PeerNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits: u64 = 0;
        let mut octets = 0;
        for part in s.split(':') {
            if part.len() != 2 {
                return Err(PeerNameError(s.to_string()));
            }
            let octet =
                u8::from_str_radix(part, 16).map_err(|_| PeerNameError(s.to_string()))?;
            bits = bits << 8 | u64::from(octet);
            octets += 1;
        }
        if octets != 6 {
            return Err(PeerNameError(s.to_string()));
        }
        Ok(PeerName(bits))
    }
}
