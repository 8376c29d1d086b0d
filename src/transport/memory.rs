//! In-process control channel over byte queues.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::ControlChannel;
use crate::codec::{MsgHeader, HEADER_LEN};
use crate::sched::{alloc_handle, RawHandle};

type Queue = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// One end of a connected in-memory channel pair.
///
/// Messages travel through the same byte encoding a socket transport would
/// use (header bytes followed by the payload), so tests exercising this
/// channel cover the wire codec as well.
pub struct MemoryChannel {
    inbox: Queue,
    outbox: Queue,
    open: Arc<AtomicBool>,
    peer_open: Arc<AtomicBool>,
    handle: RawHandle,
}

impl MemoryChannel {
    /// Create a connected pair of endpoints.
    pub fn pair() -> (MemoryChannel, MemoryChannel) {
        let a_to_b: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let a_open = Arc::new(AtomicBool::new(true));
        let b_open = Arc::new(AtomicBool::new(true));

        let a = MemoryChannel {
            inbox: b_to_a.clone(),
            outbox: a_to_b.clone(),
            open: a_open.clone(),
            peer_open: b_open.clone(),
            handle: alloc_handle(),
        };
        let b = MemoryChannel {
            inbox: a_to_b,
            outbox: b_to_a,
            open: b_open,
            peer_open: a_open,
            handle: alloc_handle(),
        };
        (a, b)
    }

    /// Close this end. Subsequent sends from the peer fail with
    /// `ConnectionReset`.
    pub fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Messages queued for this end that have not been received yet.
    pub fn pending(&self) -> usize {
        self.inbox.lock().expect("channel lock poisoned").len()
    }
}

impl ControlChannel for MemoryChannel {
    fn send(&mut self, header: &MsgHeader, payload: &[u8]) -> io::Result<usize> {
        if !self.peer_open.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "peer endpoint closed",
            ));
        }
        let mut wire = Vec::with_capacity(HEADER_LEN + payload.len());
        wire.extend_from_slice(&header.to_bytes());
        wire.extend_from_slice(payload);
        let len = wire.len();
        self.outbox
            .lock()
            .expect("channel lock poisoned")
            .push_back(wire);
        Ok(len)
    }

    fn recv(&mut self) -> io::Result<Option<(MsgHeader, Vec<u8>)>> {
        let Some(wire) = self
            .inbox
            .lock()
            .expect("channel lock poisoned")
            .pop_front()
        else {
            return Ok(None);
        };
        if wire.len() < HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "short control message",
            ));
        }
        let header = MsgHeader::from_bytes(&wire[..HEADER_LEN])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(Some((header, wire[HEADER_LEN..].to_vec())))
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}
