//! Protocols carried over the control channel and their command encoding.

use pnet::packet::ethernet::{EtherType, EtherTypes};

use crate::error::Error;

/// Command-word bit requesting that a worker be started for the identity.
pub const CMD_START: u16 = 0x4000;
/// Command-word bit requesting that the identity's worker be stopped.
pub const CMD_STOP: u16 = 0x8000;

const INTENT_MASK: u16 = CMD_START | CMD_STOP;

/// Wire tag for the address-resolution stream.
pub const TAG_ARP: u16 = 0x0010;
/// Wire tag for the host-configuration (BOOTP/DHCP) stream.
pub const TAG_BOOTP: u16 = 0x0011;

/// Strip the intent bits from a command word, leaving the bare protocol tag.
pub fn bare_tag(cmd: u16) -> u16 {
    cmd & !INTENT_MASK
}

/// The closed set of protocols a worker can capture for.
///
/// Adding a protocol means adding a variant here and a row to each
/// descriptor method below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Link-layer address resolution.
    Arp,
    /// Host configuration over IPv4 (BOOTP/DHCP).
    Bootp,
}

impl Protocol {
    /// Resolve a bare wire tag into a protocol.
    pub fn from_tag(tag: u16) -> Result<Self, Error> {
        match tag {
            TAG_ARP => Ok(Protocol::Arp),
            TAG_BOOTP => Ok(Protocol::Bootp),
            other => Err(Error::UnsupportedProtocol(other)),
        }
    }

    /// The bare wire tag for this protocol.
    pub fn tag(self) -> u16 {
        match self {
            Protocol::Arp => TAG_ARP,
            Protocol::Bootp => TAG_BOOTP,
        }
    }

    /// Human-readable name, used in worker process titles and logs.
    pub fn name(self) -> &'static str {
        match self {
            Protocol::Arp => "ARP",
            Protocol::Bootp => "BOOTP",
        }
    }

    /// The ethertype frames are sent with on the wire.
    pub fn ethertype(self) -> EtherType {
        match self {
            Protocol::Arp => EtherTypes::Arp,
            Protocol::Bootp => EtherTypes::Ipv4,
        }
    }

    /// Which filter program the worker opens its capture socket with.
    pub fn filter(self) -> FilterKind {
        match self {
            Protocol::Arp => FilterKind::Arp,
            Protocol::Bootp => FilterKind::Bootp,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Selector for the filter program a capture backend installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Match ARP traffic, optionally narrowed to one peer address.
    Arp,
    /// Match BOOTP/DHCP traffic for the interface.
    Bootp,
}

/// What a command word asks the controller to do.
///
/// A word carrying neither START nor STOP is a data/inject message for an
/// already-running identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Stop,
    Data,
}

impl Intent {
    /// Derive the intent from a command word. STOP wins over START.
    pub fn from_cmd(cmd: u16) -> Self {
        if cmd & CMD_STOP != 0 {
            Intent::Stop
        } else if cmd & CMD_START != 0 {
            Intent::Start
        } else {
            Intent::Data
        }
    }

    /// The bits this intent contributes to a command word.
    pub fn bits(self) -> u16 {
        match self {
            Intent::Start => CMD_START,
            Intent::Stop => CMD_STOP,
            Intent::Data => 0,
        }
    }
}
