//! Wire header shared by every control-channel message, and the codec
//! turning headers into validated (identity, protocol, intent) triples.

use std::net::Ipv4Addr;

use crate::domain::{bare_tag, Intent, Protocol, StreamId};
use crate::error::Error;

/// Fixed encoded header length: command word, interface index, bare tag,
/// peer address (0.0.0.0 meaning wildcard/absent).
pub const HEADER_LEN: usize = 12;

/// The header preceding every control-channel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    /// Protocol tag plus optional START/STOP intent bits.
    pub cmd: u16,
    /// The stream this message belongs to.
    pub id: StreamId,
}

impl MsgHeader {
    /// Header for a data message on an established stream.
    pub fn data(id: StreamId) -> Self {
        Self { cmd: id.tag, id }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.cmd.to_be_bytes());
        buf[2..6].copy_from_slice(&self.id.ifindex.to_be_bytes());
        buf[6..8].copy_from_slice(&self.id.tag.to_be_bytes());
        let peer = self.id.peer.unwrap_or(Ipv4Addr::UNSPECIFIED);
        buf[8..12].copy_from_slice(&peer.octets());
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != HEADER_LEN {
            return Err(Error::PayloadSize {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        let cmd = u16::from_be_bytes([data[0], data[1]]);
        let ifindex = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
        let tag = u16::from_be_bytes([data[6], data[7]]);
        let peer = Ipv4Addr::new(data[8], data[9], data[10], data[11]);
        let peer = if peer.is_unspecified() { None } else { Some(peer) };
        Ok(Self {
            cmd,
            id: StreamId { ifindex, tag, peer },
        })
    }
}

/// Build a header for the given protocol and intent.
///
/// Pure construction; validation happens on the decode side.
pub fn encode(proto: Protocol, intent: Intent, ifindex: u32, peer: Option<Ipv4Addr>) -> MsgHeader {
    MsgHeader {
        cmd: proto.tag() | intent.bits(),
        id: StreamId::new(ifindex, proto, peer),
    }
}

/// Validate a header into its stream identity, protocol, and intent.
///
/// Fails with [`Error::UnsupportedProtocol`] when the bare tag is not in
/// the recognized set, regardless of the intent bits.
pub fn decode(header: &MsgHeader) -> Result<(StreamId, Protocol, Intent), Error> {
    let proto = Protocol::from_tag(bare_tag(header.cmd))?;
    Ok((header.id, proto, Intent::from_cmd(header.cmd)))
}
