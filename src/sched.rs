//! Cooperative I/O scheduler seam.
//!
//! Both processes run a single-threaded readiness loop owned by the
//! embedding program. The fabric only needs to register interest in
//! handles, drop that interest, and ask the loop to exit with a status.

use std::sync::atomic::{AtomicI32, Ordering};

/// Token identifying a readable resource to the scheduler. For real
/// sockets this is the file descriptor; in-memory endpoints allocate
/// pseudo handles via [`alloc_handle`].
pub type RawHandle = i32;

static NEXT_HANDLE: AtomicI32 = AtomicI32::new(0x1000);

/// Allocate a process-unique pseudo handle for an in-memory endpoint.
pub fn alloc_handle() -> RawHandle {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Exit status a worker reports through its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

/// Asynchronous termination notification delivered to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Graceful termination requested by the controller.
    Terminate,
    Interrupt,
    Other(i32),
}

impl Signal {
    pub fn from_raw(signo: i32) -> Self {
        #[cfg(target_os = "linux")]
        {
            if signo == libc::SIGTERM {
                return Signal::Terminate;
            }
            if signo == libc::SIGINT {
                return Signal::Interrupt;
            }
        }
        #[cfg(not(target_os = "linux"))]
        {
            if signo == 15 {
                return Signal::Terminate;
            }
            if signo == 2 {
                return Signal::Interrupt;
            }
        }
        Signal::Other(signo)
    }
}

/// Readiness registration and exit control, implemented by the embedding
/// event loop. Callbacks run to completion before the next ready event is
/// processed; nothing here may block.
pub trait Scheduler {
    /// Register a handle for readability. The loop will invoke the relay
    /// callback bound to it whenever it becomes readable.
    fn watch_read(&mut self, handle: RawHandle) -> crate::Result<()>;

    /// Drop interest in a handle.
    fn unwatch(&mut self, handle: RawHandle);

    /// Ask the loop to terminate the process with the given status once
    /// the current callback returns.
    fn request_exit(&mut self, status: ExitStatus);
}
