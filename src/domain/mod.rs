//! Domain types for the capture-worker fabric.
//!
//! These are the values exchanged between the controller and its workers,
//! independent of any transport or capture backend.

mod frame;
mod identity;
mod iface;
mod protocol;

pub use frame::{FrameFlags, FrameView, FLAGS_LEN, MAX_FRAME_LEN};
pub use identity::StreamId;
pub use iface::{InterfaceSnapshot, InterfaceTable, IFNAMSIZ};
pub use protocol::{bare_tag, FilterKind, Intent, Protocol, CMD_START, CMD_STOP, TAG_ARP, TAG_BOOTP};
