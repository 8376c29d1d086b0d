//! Best-effort platform hardening for capture workers.
//!
//! Not every platform can restrict an open descriptor or sandbox a
//! running process; failures here are logged by the caller and never
//! abort the worker.

use crate::sched::RawHandle;

/// Post-setup privilege reduction applied inside the worker, after the
/// filter socket is open.
pub trait Hardening {
    /// Restrict the filter handle to read, write, event-wait, and
    /// configuration ioctls. Ioctl stays permitted because the filter
    /// program may need to change after open.
    fn restrict_handle(&self, handle: RawHandle) -> crate::Result<()>;

    /// Confine the rest of the process lifetime to the handles it
    /// already holds.
    fn enter_sandbox(&self) -> crate::Result<()>;
}

/// Hardening for platforms without support; every call succeeds without
/// doing anything.
#[derive(Debug, Default)]
pub struct NoopHardening;

impl Hardening for NoopHardening {
    fn restrict_handle(&self, _handle: RawHandle) -> crate::Result<()> {
        Ok(())
    }

    fn enter_sandbox(&self) -> crate::Result<()> {
        Ok(())
    }
}

/// Linux hardening via capability sets.
///
/// Linux has no per-descriptor rights; the nearest equivalent is dropping
/// `CAP_NET_RAW` once the filter socket exists, so a compromised worker
/// cannot open new raw sockets. The open descriptor stays valid.
#[cfg(target_os = "linux")]
#[derive(Debug, Default)]
pub struct CapsHardening;

#[cfg(target_os = "linux")]
impl Hardening for CapsHardening {
    fn restrict_handle(&self, _handle: RawHandle) -> crate::Result<()> {
        use caps::{CapSet, Capability};

        use crate::error::Error;

        let held = caps::has_cap(None, CapSet::Effective, Capability::CAP_NET_RAW)
            .map_err(|e| Error::Hardening(e.to_string()))?;
        if !held {
            return Ok(());
        }
        caps::drop(None, CapSet::Effective, Capability::CAP_NET_RAW)
            .map_err(|e| Error::Hardening(e.to_string()))?;
        // Dropping from the permitted set as well prevents re-acquisition.
        if caps::has_cap(None, CapSet::Permitted, Capability::CAP_NET_RAW).unwrap_or(false) {
            if let Err(e) = caps::drop(None, CapSet::Permitted, Capability::CAP_NET_RAW) {
                tracing::warn!("could not drop CAP_NET_RAW from permitted set: {e}");
            }
        }
        Ok(())
    }

    fn enter_sandbox(&self) -> crate::Result<()> {
        use caps::CapSet;

        use crate::error::Error;

        caps::clear(None, CapSet::Effective).map_err(|e| Error::Hardening(e.to_string()))?;
        caps::clear(None, CapSet::Permitted).map_err(|e| Error::Hardening(e.to_string()))?;
        Ok(())
    }
}

/// The hardening implementation for the build target.
#[cfg(target_os = "linux")]
pub fn platform_hardening() -> Box<dyn Hardening> {
    Box::new(CapsHardening)
}

/// The hardening implementation for the build target.
#[cfg(not(target_os = "linux"))]
pub fn platform_hardening() -> Box<dyn Hardening> {
    Box::new(NoopHardening)
}
