//! Delivery of captured frames to protocol handlers.
//!
//! The controller splits each relayed capture message into its flags and
//! frame bytes, resolves the interface, and hands the frame to whichever
//! handler matches the stream's protocol. The handlers themselves (lease
//! logic, address-conflict detection) live outside this crate.

mod console;

pub use console::ConsoleSink;

use crate::domain::{FrameFlags, InterfaceSnapshot};

/// Receives captured frames, one method per supported protocol.
pub trait PacketSink {
    /// A frame from an address-resolution stream.
    fn arp_frame(&mut self, iface: &InterfaceSnapshot, frame: &[u8], flags: FrameFlags);

    /// A frame from a host-configuration stream.
    fn bootp_frame(&mut self, iface: &InterfaceSnapshot, frame: &[u8], flags: FrameFlags);
}
