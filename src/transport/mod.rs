//! Control-channel transport abstraction.
//!
//! The fabric exchanges framed (header, payload) messages between the
//! controller and each worker. This trait is the seam over the concrete
//! transport (a socketpair in production); [`MemoryChannel`] provides an
//! in-process implementation for tests and the replay harness.

mod memory;

pub use memory::MemoryChannel;

use std::io;

use crate::codec::MsgHeader;
use crate::sched::RawHandle;

/// A framed, byte-oriented message channel between two processes.
pub trait ControlChannel {
    /// Send one message. Returns the number of bytes queued; `Ok(0)`
    /// means the peer has gone away without an error being raised.
    fn send(&mut self, header: &MsgHeader, payload: &[u8]) -> io::Result<usize>;

    /// Receive one message if available. `Ok(None)` means nothing is
    /// pending; the channel is non-blocking and only read when the
    /// scheduler signals readability.
    fn recv(&mut self) -> io::Result<Option<(MsgHeader, Vec<u8>)>>;

    /// The handle registered with the scheduler for readability.
    fn raw_handle(&self) -> RawHandle;
}
