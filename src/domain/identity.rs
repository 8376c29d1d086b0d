//! The key naming one logical filtered-packet stream.

use std::net::Ipv4Addr;

use super::Protocol;

/// Identity of one capture stream: at most one live worker exists per
/// `StreamId` at any time.
///
/// The protocol is stored as its bare wire tag so an identity decoded from
/// an inbound header can be used for registry lookup before the tag has
/// been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId {
    /// Stable OS index of the network interface.
    pub ifindex: u32,
    /// Bare protocol tag, without intent bits.
    pub tag: u16,
    /// Peer/filter address; `None` means wildcard. Present only for
    /// address-resolution streams.
    pub peer: Option<Ipv4Addr>,
}

impl StreamId {
    pub fn new(ifindex: u32, proto: Protocol, peer: Option<Ipv4Addr>) -> Self {
        Self {
            ifindex,
            tag: proto.tag(),
            peer,
        }
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match Protocol::from_tag(self.tag) {
            Ok(proto) => write!(f, "{}#{}", proto, self.ifindex)?,
            Err(_) => write!(f, "{:#06x}#{}", self.tag, self.ifindex)?,
        }
        if let Some(peer) = self.peer {
            write!(f, "/{}", peer)?;
        }
        Ok(())
    }
}
