//! Process-spawning seam.
//!
//! Spawning a capture worker is a privileged operation owned by the
//! embedding program. The fabric hands the spawner a fully-populated
//! [`WorkerRecord`](crate::registry::WorkerRecord) and receives back the
//! child's process identifier and the controller-side end of its control
//! channel.
//!
//! Contract for implementations: the child process must
//! 1. drop privileges before anything else when `drop_privs` is set,
//! 2. run [`worker::start_worker`](crate::worker::start_worker) with its
//!    inherited registry and its own end of the control channel,
//! 3. drive [`Worker::on_filter_ready`](crate::worker::Worker::on_filter_ready)
//!    and [`Worker::on_control_ready`](crate::worker::Worker::on_control_ready)
//!    from its scheduler, and
//! 4. route asynchronous termination notifications to
//!    [`worker::handle_signal`](crate::worker::handle_signal).
//!
//! Failures are reported as [`Error::Spawn`](crate::Error::Spawn).

use crate::registry::WorkerRecord;
use crate::transport::ControlChannel;

/// Handles returned to the controller for a freshly spawned worker.
pub struct SpawnedWorker {
    /// OS process identifier of the worker.
    pub pid: u32,
    /// Controller-side end of the worker's control channel.
    pub channel: Box<dyn ControlChannel>,
}

/// Spawns and terminates worker processes.
pub trait Spawner {
    /// Spawn a worker for the record's identity. `drop_privs` requests
    /// that the child shed elevated privileges before opening its filter.
    fn spawn(&mut self, record: &WorkerRecord, drop_privs: bool) -> crate::Result<SpawnedWorker>;

    /// Request graceful termination of a previously spawned worker. The
    /// worker's signal hook maps this to a success exit status.
    fn terminate(&mut self, pid: u32) -> crate::Result<()>;
}
