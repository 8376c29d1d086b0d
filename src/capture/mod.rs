//! Filter-socket abstraction.
//!
//! The raw, protocol-filtered capture socket is opened inside the worker
//! after privileges are dropped. The traits here are the seam over the
//! platform primitive (a BPF descriptor or packet socket in production);
//! [`ReplayFilter`] provides a queue-backed implementation for tests and
//! offline replay.

mod replay;

pub use replay::{ReplayBackend, ReplayFilter};

use std::io;
use std::net::Ipv4Addr;

use pnet::packet::ethernet::EtherType;

use crate::domain::{FilterKind, FrameFlags, InterfaceSnapshot};
use crate::sched::RawHandle;

/// An open, filtered capture/injection socket bound to one interface.
pub trait FilterSocket {
    /// Read the next filtered frame into `buf`, returning its length.
    /// `Ok(0)` means the stream has ended. A read that exhausts the
    /// socket's buffered batch sets [`FrameFlags::END_OF_BATCH`].
    fn read_frame(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Inject one frame onto the wire with the given ethertype.
    fn send_frame(&mut self, ethertype: EtherType, frame: &[u8]) -> io::Result<usize>;

    /// Current relay flags, stamped onto each forwarded frame.
    fn flags(&self) -> FrameFlags;

    /// Clear [`FrameFlags::END_OF_BATCH`] before a drain pass.
    fn clear_end_of_batch(&mut self);

    /// The handle registered with the scheduler for readability.
    fn raw_handle(&self) -> RawHandle;
}

/// Opens filter sockets. Implemented over the platform capture primitive;
/// invoked exactly once per worker, inside the worker, before any frame
/// is relayed.
pub trait CaptureBackend {
    fn open(
        &self,
        iface: &InterfaceSnapshot,
        filter: FilterKind,
        peer: Option<Ipv4Addr>,
    ) -> crate::Result<Box<dyn FilterSocket>>;
}
