//! Logging sink used by the replay harness.

use pnet::packet::ethernet::EthernetPacket;
use pretty_hex::PrettyHex;

use super::PacketSink;
use crate::domain::{FrameFlags, InterfaceSnapshot};

/// Sink that reports every delivered frame through `tracing`.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    frames: usize,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames delivered so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn report(&mut self, proto: &str, iface: &InterfaceSnapshot, frame: &[u8], flags: FrameFlags) {
        self.frames += 1;
        match EthernetPacket::new(frame) {
            Some(eth) => tracing::info!(
                "{proto} frame on {}: {} -> {}, {} bytes, flags {:#04x}",
                iface.name,
                eth.get_source(),
                eth.get_destination(),
                frame.len(),
                flags.bits()
            ),
            None => tracing::info!(
                "{proto} frame on {}: {} bytes (short), flags {:#04x}",
                iface.name,
                frame.len(),
                flags.bits()
            ),
        }
        tracing::debug!("{proto} frame bytes\n{:?}", frame.hex_dump());
    }
}

impl PacketSink for ConsoleSink {
    fn arp_frame(&mut self, iface: &InterfaceSnapshot, frame: &[u8], flags: FrameFlags) {
        self.report("ARP", iface, frame, flags);
    }

    fn bootp_frame(&mut self, iface: &InterfaceSnapshot, frame: &[u8], flags: FrameFlags) {
        self.report("BOOTP", iface, frame, flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macaddr::MacAddr6;

    #[test]
    fn counts_delivered_frames() {
        let iface = InterfaceSnapshot {
            index: 1,
            name: "lo".to_string(),
            hwaddr: MacAddr6::new(0, 0, 0, 0, 0, 0),
            mtu: 65536,
            up: true,
        };
        let mut sink = ConsoleSink::new();
        sink.arp_frame(&iface, &[0u8; 14], FrameFlags::empty());
        sink.bootp_frame(&iface, &[0u8; 4], FrameFlags::END_OF_BATCH);
        assert_eq!(sink.frames(), 2);
    }
}
