//! Gossip wire format — on-wire envelopes for the three delivery modes.
//!
//! These types ARE the protocol. Every field, every size, and the channel
//! hash function are part of the wire contract; peers that disagree on any
//! of them cannot exchange gossip. Multi-byte integers are big-endian,
//! payloads are length-prefixed by a 32-bit count, and peer names travel as
//! fixed 64-bit values.
//!
//! Fixed-size header prefixes use zerocopy derives for deterministic layout
//! and allocation-free decoding. There is no unsafe code in this module.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::peer::PeerName;

// ── Frame kinds ──────────────────────────────────────────────────────────────

/// One-byte tag carried by the transport ahead of each gossip frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// Periodic merge state; relayed implicitly by re-gossip of deltas.
    Gossip = 1,
    /// Payload delivered on every peer reachable in the broadcast
    /// spanning tree rooted at the original sender.
    GossipBroadcast = 2,
    /// Payload addressed to a single destination peer.
    GossipUnicast = 3,
}

impl FrameKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Gossip),
            2 => Some(Self::GossipBroadcast),
            3 => Some(Self::GossipUnicast),
            _ => None,
        }
    }
}

// ── Channel hash ─────────────────────────────────────────────────────────────

/// Compute a channel's wire identifier from its name.
///
/// First four bytes of the BLAKE3 digest of the UTF-8 name, big-endian.
/// All peers must compute the same value for the same name; a collision
/// between two distinct channel names is a configuration error.
pub fn channel_hash(name: &str) -> u32 {
    let digest = blake3::hash(name.as_bytes());
    let d = digest.as_bytes();
    u32::from_be_bytes([d[0], d[1], d[2], d[3]])
}

// ── Envelope headers ─────────────────────────────────────────────────────────

/// Header of `Gossip` and `GossipBroadcast` frames.
///
/// `src` is the peer that originated the envelope, not the forwarding
/// neighbor. Intermediate hops never rewrite it.
///
/// Wire size: 12 bytes.
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes, Unaligned)]
#[repr(C)]
struct GossipHeader {
    channel_hash: U32<BigEndian>,
    src: U64<BigEndian>,
}

assert_eq_size!(GossipHeader, [u8; 12]);

/// Header of `GossipUnicast` frames. Adds the destination peer.
///
/// Wire size: 20 bytes.
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes, Unaligned)]
#[repr(C)]
struct UnicastHeader {
    channel_hash: U32<BigEndian>,
    src: U64<BigEndian>,
    dst: U64<BigEndian>,
}

assert_eq_size!(UnicastHeader, [u8; 20]);

const GOSSIP_HEADER_LEN: usize = std::mem::size_of::<GossipHeader>();
const UNICAST_HEADER_LEN: usize = std::mem::size_of::<UnicastHeader>();

// ── Decode errors ────────────────────────────────────────────────────────────

/// A frame that does not follow the wire contract. Malformed frames are
/// dropped by the receiver; the connection is retained.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("frame truncated: {need} more bytes required")]
    Truncated { need: usize },
    #[error("payload length {claimed} exceeds {remaining} remaining bytes")]
    PayloadOverrun { claimed: usize, remaining: usize },
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

// ── Envelope ─────────────────────────────────────────────────────────────────

/// A decoded gossip frame: kind, channel, source, optional destination, and
/// the opaque application payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Gossip {
        channel_hash: u32,
        src: PeerName,
        payload: Bytes,
    },
    Broadcast {
        channel_hash: u32,
        src: PeerName,
        payload: Bytes,
    },
    Unicast {
        channel_hash: u32,
        src: PeerName,
        dst: PeerName,
        payload: Bytes,
    },
}

impl Envelope {
    pub fn kind(&self) -> FrameKind {
        match self {
            Envelope::Gossip { .. } => FrameKind::Gossip,
            Envelope::Broadcast { .. } => FrameKind::GossipBroadcast,
            Envelope::Unicast { .. } => FrameKind::GossipUnicast,
        }
    }

    pub fn channel_hash(&self) -> u32 {
        match self {
            Envelope::Gossip { channel_hash, .. }
            | Envelope::Broadcast { channel_hash, .. }
            | Envelope::Unicast { channel_hash, .. } => *channel_hash,
        }
    }

    /// The peer that originated this envelope.
    pub fn src(&self) -> PeerName {
        match self {
            Envelope::Gossip { src, .. }
            | Envelope::Broadcast { src, .. }
            | Envelope::Unicast { src, .. } => *src,
        }
    }

    pub fn payload(&self) -> &Bytes {
        match self {
            Envelope::Gossip { payload, .. }
            | Envelope::Broadcast { payload, .. }
            | Envelope::Unicast { payload, .. } => payload,
        }
    }

    /// Serialize the envelope body (everything after the transport's kind tag).
    pub fn encode(&self) -> Bytes {
        match self {
            Envelope::Gossip {
                channel_hash,
                src,
                payload,
            }
            | Envelope::Broadcast {
                channel_hash,
                src,
                payload,
            } => {
                let header = GossipHeader {
                    channel_hash: U32::new(*channel_hash),
                    src: U64::new(src.bits()),
                };
                let mut buf = BytesMut::with_capacity(GOSSIP_HEADER_LEN + 4 + payload.len());
                buf.put_slice(header.as_bytes());
                put_payload(&mut buf, payload);
                buf.freeze()
            }
            Envelope::Unicast {
                channel_hash,
                src,
                dst,
                payload,
            } => {
                let header = UnicastHeader {
                    channel_hash: U32::new(*channel_hash),
                    src: U64::new(src.bits()),
                    dst: U64::new(dst.bits()),
                };
                let mut buf = BytesMut::with_capacity(UNICAST_HEADER_LEN + 4 + payload.len());
                buf.put_slice(header.as_bytes());
                put_payload(&mut buf, payload);
                buf.freeze()
            }
        }
    }

    /// Parse an envelope body received from the transport.
    ///
    /// Rejects short frames, payload counts that overrun the frame, and
    /// trailing bytes. Never panics on arbitrary input.
    pub fn decode(kind: FrameKind, frame: &[u8]) -> Result<Envelope, WireError> {
        match kind {
            FrameKind::Gossip | FrameKind::GossipBroadcast => {
                let header = GossipHeader::read_from_prefix(frame).ok_or(WireError::Truncated {
                    need: GOSSIP_HEADER_LEN.saturating_sub(frame.len()),
                })?;
                let payload = read_payload(&frame[GOSSIP_HEADER_LEN..])?;
                let channel_hash = header.channel_hash.get();
                let src = PeerName::from_bits(header.src.get());
                Ok(match kind {
                    FrameKind::Gossip => Envelope::Gossip {
                        channel_hash,
                        src,
                        payload,
                    },
                    _ => Envelope::Broadcast {
                        channel_hash,
                        src,
                        payload,
                    },
                })
            }
            FrameKind::GossipUnicast => {
                let header = UnicastHeader::read_from_prefix(frame).ok_or(WireError::Truncated {
                    need: UNICAST_HEADER_LEN.saturating_sub(frame.len()),
                })?;
                let payload = read_payload(&frame[UNICAST_HEADER_LEN..])?;
                Ok(Envelope::Unicast {
                    channel_hash: header.channel_hash.get(),
                    src: PeerName::from_bits(header.src.get()),
                    dst: PeerName::from_bits(header.dst.get()),
                    payload,
                })
            }
        }
    }
}

fn put_payload(buf: &mut BytesMut, payload: &[u8]) {
    // The count field is 32 bits; larger payloads cannot be framed.
    assert!(payload.len() <= u32::MAX as usize, "payload exceeds frame limit");
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
}

fn read_payload(mut rest: &[u8]) -> Result<Bytes, WireError> {
    if rest.len() < 4 {
        return Err(WireError::Truncated {
            need: 4 - rest.len(),
        });
    }
    let claimed = rest.get_u32() as usize;
    if claimed > rest.len() {
        return Err(WireError::PayloadOverrun {
            claimed,
            remaining: rest.len(),
        });
    }
    if claimed < rest.len() {
        return Err(WireError::TrailingBytes(rest.len() - claimed));
    }
    Ok(Bytes::copy_from_slice(rest))
}
