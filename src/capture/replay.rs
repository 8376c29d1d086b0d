//! Queue-backed filter socket for tests and offline replay.

use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use pnet::packet::ethernet::EtherType;

use super::{CaptureBackend, FilterSocket};
use crate::domain::{FilterKind, FrameFlags, InterfaceSnapshot};
use crate::sched::{alloc_handle, RawHandle};

#[derive(Default)]
struct Inner {
    queued: VecDeque<Vec<u8>>,
    injected: Vec<(EtherType, Vec<u8>)>,
    flags: FrameFlags,
}

/// A filter socket fed from a queue of pre-recorded frames.
///
/// Mirrors the batch discipline of a real filter socket: the read that
/// drains the last queued frame raises END_OF_BATCH, and reading past the
/// end returns zero length. Injected frames are retained for inspection.
///
/// Clones share state, so a harness can keep one handle while the worker
/// owns another.
#[derive(Clone)]
pub struct ReplayFilter {
    inner: Arc<Mutex<Inner>>,
    handle: RawHandle,
}

impl ReplayFilter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            handle: alloc_handle(),
        }
    }

    /// Append a frame to the readable batch.
    pub fn queue_frame(&self, frame: impl Into<Vec<u8>>) {
        self.lock().queued.push_back(frame.into());
    }

    /// Frames passed to [`FilterSocket::send_frame`], in order.
    pub fn injected(&self) -> Vec<(EtherType, Vec<u8>)> {
        self.lock().injected.clone()
    }

    /// Frames still queued for reading.
    pub fn queued(&self) -> usize {
        self.lock().queued.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("replay filter lock poisoned")
    }
}

impl Default for ReplayFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterSocket for ReplayFilter {
    fn read_frame(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        let Some(frame) = inner.queued.pop_front() else {
            inner.flags.insert(FrameFlags::END_OF_BATCH);
            return Ok(0);
        };
        if inner.queued.is_empty() {
            inner.flags.insert(FrameFlags::END_OF_BATCH);
        }
        let n = frame.len().min(buf.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Ok(n)
    }

    fn send_frame(&mut self, ethertype: EtherType, frame: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.injected.push((ethertype, frame.to_vec()));
        Ok(frame.len())
    }

    fn flags(&self) -> FrameFlags {
        self.lock().flags
    }

    fn clear_end_of_batch(&mut self) {
        self.lock().flags.remove(FrameFlags::END_OF_BATCH);
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

/// Capture backend handing out clones of one shared [`ReplayFilter`].
pub struct ReplayBackend {
    filter: ReplayFilter,
}

impl ReplayBackend {
    pub fn new(filter: ReplayFilter) -> Self {
        Self { filter }
    }
}

impl CaptureBackend for ReplayBackend {
    fn open(
        &self,
        _iface: &InterfaceSnapshot,
        _filter: FilterKind,
        _peer: Option<Ipv4Addr>,
    ) -> crate::Result<Box<dyn FilterSocket>> {
        Ok(Box::new(self.filter.clone()))
    }
}
