//! Worker-side setup, relay loop, and termination handling.
//!
//! A worker owns exactly two handles: its filter socket and its control
//! channel. Captured frames flow filter → channel with a flags prefix;
//! injected frames flow channel → filter. Both directions are driven by
//! scheduler readiness callbacks and run to completion per wakeup.

use std::io;
use std::net::Ipv4Addr;

use crate::capture::{CaptureBackend, FilterSocket};
use crate::codec::MsgHeader;
use crate::domain::{InterfaceSnapshot, Protocol, StreamId, FLAGS_LEN, MAX_FRAME_LEN};
use crate::error::Error;
use crate::hardening::Hardening;
use crate::registry::WorkerRegistry;
use crate::sched::{ExitStatus, Scheduler, Signal};
use crate::transport::ControlChannel;

/// A running capture worker.
pub struct Worker {
    id: StreamId,
    proto: Protocol,
    filter: Box<dyn FilterSocket>,
    channel: Box<dyn ControlChannel>,
}

impl Worker {
    /// Assemble a worker from already-open handles. Production workers go
    /// through [`start_worker`]; this constructor exists for harnesses
    /// that provide their own filter and channel.
    pub fn new(
        id: StreamId,
        proto: Protocol,
        filter: Box<dyn FilterSocket>,
        channel: Box<dyn ControlChannel>,
    ) -> Self {
        Self {
            id,
            proto,
            filter,
            channel,
        }
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn proto(&self) -> Protocol {
        self.proto
    }

    /// Capture path, invoked when the filter handle is readable.
    ///
    /// A single wakeup can leave several frames in the filter buffer;
    /// they are all drained before returning to the scheduler. I/O
    /// failures stop the drain for this wakeup only; the next readiness
    /// event retries.
    pub fn on_filter_ready(&mut self) {
        let mut buf = [0u8; FLAGS_LEN + MAX_FRAME_LEN];
        let header = MsgHeader::data(self.id);

        self.filter.clear_end_of_batch();
        while !self.filter.flags().end_of_batch() {
            let len = match self.filter.read_frame(&mut buf[FLAGS_LEN..]) {
                Ok(0) => break,
                Ok(len) => len,
                Err(e) => {
                    tracing::error!("{}: filter read failed: {e}", self.id);
                    break;
                }
            };
            // Stamp the flags as they stand after the read, so the
            // controller sees END_OF_BATCH on the batch's last frame.
            buf[0] = self.filter.flags().bits();
            match self.channel.send(&header, &buf[..FLAGS_LEN + len]) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    if e.kind() != io::ErrorKind::ConnectionReset {
                        tracing::error!("{}: relay send failed: {e}", self.id);
                    }
                    break;
                }
            }
        }
    }

    /// Inject path, invoked when the control channel is readable.
    pub fn on_control_ready(&mut self) {
        if let Err(e) = self.inject() {
            tracing::error!("{}: inject failed: {e}", self.id);
        }
    }

    /// Receive one pending control message and pass its payload to the
    /// filter's send path, tagged with this worker's bound ethertype.
    /// Returns the number of bytes injected, zero if nothing was pending.
    pub fn inject(&mut self) -> crate::Result<usize> {
        let Some((header, payload)) = self.channel.recv()? else {
            return Ok(0);
        };
        // A running worker should only ever see data frames for its
        // recognized protocols; anything else is an IPC violation.
        if Protocol::from_tag(header.cmd).is_err() {
            return Err(Error::InvalidState(format!(
                "unexpected command {:#06x} on worker channel",
                header.cmd
            )));
        }
        Ok(self.filter.send_frame(self.proto.ethertype(), &payload)?)
    }
}

/// Worker-side setup, run in the spawned process before any networking.
///
/// Prunes the inherited registry down to this worker's own record, sets
/// the process title, opens the filter socket, applies best-effort
/// hardening, and registers the filter handle for readability. Open and
/// registration failures are fatal: the scheduler is told to exit with
/// failure status and the error is returned.
pub fn start_worker(
    registry: &mut WorkerRegistry,
    id: &StreamId,
    channel: Box<dyn ControlChannel>,
    backend: &dyn CaptureBackend,
    hardening: &dyn Hardening,
    scheduler: &mut dyn Scheduler,
) -> crate::Result<Worker> {
    // A worker must not retain handles to unrelated workers; this is the
    // sole place the registry is pruned.
    registry.retain_only(id);
    let record = match registry.remove(id) {
        Some(record) => record,
        None => {
            scheduler.request_exit(ExitStatus::Failure);
            return Err(Error::InvalidState(format!("no record for {id}")));
        }
    };

    let proto = record.proto();
    set_process_title(&process_title(proto, record.iface(), id.peer));

    let filter = match backend.open(record.iface(), proto.filter(), id.peer) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::error!("{id}: filter open failed: {e}");
            scheduler.request_exit(ExitStatus::Failure);
            return Err(e);
        }
    };

    if let Err(e) = hardening.restrict_handle(filter.raw_handle()) {
        tracing::warn!("{id}: handle restriction unavailable: {e}");
    }

    if let Err(e) = scheduler.watch_read(filter.raw_handle()) {
        tracing::error!("{id}: scheduler registration failed: {e}");
        scheduler.request_exit(ExitStatus::Failure);
        return Err(e);
    }

    if let Err(e) = hardening.enter_sandbox() {
        tracing::warn!("{id}: sandbox unavailable: {e}");
    }

    Ok(Worker {
        id: *id,
        proto,
        filter,
        channel,
    })
}

/// Map an asynchronous termination notification to a scheduler exit.
///
/// Graceful termination exits with success so the controller's reap logic
/// can tell an honored Stop from a crashed worker.
pub fn handle_signal(signal: Signal, scheduler: &mut dyn Scheduler) {
    let status = match signal {
        Signal::Terminate => ExitStatus::Success,
        _ => ExitStatus::Failure,
    };
    scheduler.request_exit(status);
}

/// Title shown for the worker in process listings.
pub fn process_title(proto: Protocol, iface: &InterfaceSnapshot, peer: Option<Ipv4Addr>) -> String {
    match peer {
        Some(peer) => format!("[{} {}] [{}]", proto.name(), iface.name, peer),
        None => format!("[{} {}]", proto.name(), iface.name),
    }
}

#[cfg(target_os = "linux")]
fn set_process_title(title: &str) {
    use std::ffi::CString;

    let Ok(title) = CString::new(title) else {
        return;
    };
    // The kernel truncates PR_SET_NAME to 15 bytes.
    unsafe {
        libc::prctl(libc::PR_SET_NAME, title.as_ptr() as libc::c_ulong, 0, 0, 0);
    }
}

#[cfg(not(target_os = "linux"))]
fn set_process_title(_title: &str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ReplayBackend, ReplayFilter};
    use crate::codec;
    use crate::domain::{FrameFlags, Intent, CMD_START, TAG_ARP};
    use crate::hardening::NoopHardening;
    use crate::registry::WorkerRecord;
    use crate::sched::RawHandle;
    use crate::transport::MemoryChannel;
    use macaddr::MacAddr6;
    use pnet::packet::ethernet::EtherTypes;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn iface() -> InterfaceSnapshot {
        InterfaceSnapshot {
            index: 2,
            name: "eth0".to_string(),
            hwaddr: MacAddr6::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff),
            mtu: 1500,
            up: true,
        }
    }

    fn arp_id() -> StreamId {
        StreamId::new(2, Protocol::Arp, Some(Ipv4Addr::new(10, 0, 0, 1)))
    }

    #[derive(Default)]
    struct SchedState {
        watched: Vec<RawHandle>,
        exits: Vec<ExitStatus>,
    }

    #[derive(Clone, Default)]
    struct TestScheduler {
        state: Rc<RefCell<SchedState>>,
    }

    impl Scheduler for TestScheduler {
        fn watch_read(&mut self, handle: RawHandle) -> crate::Result<()> {
            self.state.borrow_mut().watched.push(handle);
            Ok(())
        }

        fn unwatch(&mut self, _handle: RawHandle) {}

        fn request_exit(&mut self, status: ExitStatus) {
            self.state.borrow_mut().exits.push(status);
        }
    }

    fn spawn_test_worker(filter: &ReplayFilter) -> (Worker, MemoryChannel) {
        let (worker_end, controller_end) = MemoryChannel::pair();
        let worker = Worker::new(
            arp_id(),
            Protocol::Arp,
            Box::new(filter.clone()),
            Box::new(worker_end),
        );
        (worker, controller_end)
    }

    mod relay_tests {
        use super::*;

        #[test]
        fn drains_every_buffered_frame_in_order() {
            let filter = ReplayFilter::new();
            filter.queue_frame(vec![0x01]);
            filter.queue_frame(vec![0x02]);
            filter.queue_frame(vec![0x03]);
            let (mut worker, mut controller_end) = spawn_test_worker(&filter);

            worker.on_filter_ready();

            let mut payloads = Vec::new();
            while let Some((header, payload)) = controller_end.recv().unwrap() {
                assert_eq!(header.cmd, TAG_ARP);
                assert_eq!(header.id, arp_id());
                payloads.push(payload);
            }
            assert_eq!(payloads.len(), 3);
            // Frame bytes follow the flags prefix, in arrival order.
            assert_eq!(&payloads[0][FLAGS_LEN..], &[0x01]);
            assert_eq!(&payloads[1][FLAGS_LEN..], &[0x02]);
            assert_eq!(&payloads[2][FLAGS_LEN..], &[0x03]);
            // Only the batch's last frame carries END_OF_BATCH.
            assert!(!FrameFlags::from_bits(payloads[0][0]).end_of_batch());
            assert!(!FrameFlags::from_bits(payloads[1][0]).end_of_batch());
            assert!(FrameFlags::from_bits(payloads[2][0]).end_of_batch());
        }

        #[test]
        fn zero_length_read_ends_drain_without_forwarding() {
            let filter = ReplayFilter::new();
            filter.queue_frame(Vec::new());
            filter.queue_frame(vec![0x01]);
            let (mut worker, controller_end) = spawn_test_worker(&filter);

            worker.on_filter_ready();

            assert_eq!(controller_end.pending(), 0);
        }

        #[test]
        fn empty_filter_produces_no_messages() {
            let filter = ReplayFilter::new();
            let (mut worker, controller_end) = spawn_test_worker(&filter);
            worker.on_filter_ready();
            assert_eq!(controller_end.pending(), 0);
        }

        #[test]
        fn read_error_stops_drain_for_this_wakeup() {
            struct FailingFilter;

            impl FilterSocket for FailingFilter {
                fn read_frame(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                    Err(io::Error::other("device gone"))
                }

                fn send_frame(
                    &mut self,
                    _ethertype: pnet::packet::ethernet::EtherType,
                    _frame: &[u8],
                ) -> io::Result<usize> {
                    unreachable!("capture test never injects")
                }

                fn flags(&self) -> FrameFlags {
                    FrameFlags::empty()
                }

                fn clear_end_of_batch(&mut self) {}

                fn raw_handle(&self) -> RawHandle {
                    7
                }
            }

            let (worker_end, controller_end) = MemoryChannel::pair();
            let mut worker = Worker::new(
                arp_id(),
                Protocol::Arp,
                Box::new(FailingFilter),
                Box::new(worker_end),
            );

            worker.on_filter_ready();
            assert_eq!(controller_end.pending(), 0);
        }

        #[test]
        fn send_failure_stops_drain() {
            let filter = ReplayFilter::new();
            filter.queue_frame(vec![0x01]);
            filter.queue_frame(vec![0x02]);
            filter.queue_frame(vec![0x03]);
            let (mut worker, mut controller_end) = spawn_test_worker(&filter);
            controller_end.close();

            worker.on_filter_ready();

            // The first send fails; the remaining frames stay queued for
            // the next wakeup.
            assert_eq!(filter.queued(), 2);
        }
    }

    mod inject_tests {
        use super::*;

        #[test]
        fn forwards_payload_with_bound_ethertype() {
            let filter = ReplayFilter::new();
            let (mut worker, mut controller_end) = spawn_test_worker(&filter);

            let header = MsgHeader::data(arp_id());
            controller_end.send(&header, &[0x01, 0x02]).unwrap();

            assert_eq!(worker.inject().unwrap(), 2);
            let injected = filter.injected();
            assert_eq!(injected, vec![(EtherTypes::Arp, vec![0x01, 0x02])]);
        }

        #[test]
        fn rejects_unknown_command() {
            let filter = ReplayFilter::new();
            let (mut worker, mut controller_end) = spawn_test_worker(&filter);

            let mut header = MsgHeader::data(arp_id());
            header.cmd = 0x0099;
            controller_end.send(&header, &[0x01]).unwrap();

            assert!(matches!(worker.inject(), Err(Error::InvalidState(_))));
            assert!(filter.injected().is_empty());
        }

        #[test]
        fn rejects_commands_carrying_intent_bits() {
            let filter = ReplayFilter::new();
            let (mut worker, mut controller_end) = spawn_test_worker(&filter);

            let mut header = MsgHeader::data(arp_id());
            header.cmd = TAG_ARP | CMD_START;
            controller_end.send(&header, &[0x01]).unwrap();

            assert!(matches!(worker.inject(), Err(Error::InvalidState(_))));
        }

        #[test]
        fn quiet_channel_injects_nothing() {
            let filter = ReplayFilter::new();
            let (mut worker, _controller_end) = spawn_test_worker(&filter);
            assert_eq!(worker.inject().unwrap(), 0);
            assert!(filter.injected().is_empty());
        }

        #[test]
        fn injected_length_matches_payload_length() {
            let filter = ReplayFilter::new();
            let (mut worker, mut controller_end) = spawn_test_worker(&filter);

            let payload = vec![0xab; 300];
            let header = codec::encode(
                Protocol::Arp,
                Intent::Data,
                2,
                Some(Ipv4Addr::new(10, 0, 0, 1)),
            );
            controller_end.send(&header, &payload).unwrap();

            assert_eq!(worker.inject().unwrap(), 300);
            assert_eq!(filter.injected()[0].1.len(), 300);
        }
    }

    mod setup_tests {
        use super::*;

        #[test]
        fn start_prunes_registry_and_watches_filter() {
            let mut registry = WorkerRegistry::new();
            registry.insert(WorkerRecord::new(arp_id(), iface(), Protocol::Arp));
            registry.insert(WorkerRecord::new(
                StreamId::new(3, Protocol::Bootp, None),
                iface(),
                Protocol::Bootp,
            ));

            let filter = ReplayFilter::new();
            let backend = ReplayBackend::new(filter.clone());
            let mut scheduler = TestScheduler::default();
            let (worker_end, _controller_end) = MemoryChannel::pair();

            let worker = start_worker(
                &mut registry,
                &arp_id(),
                Box::new(worker_end),
                &backend,
                &NoopHardening,
                &mut scheduler,
            )
            .unwrap();

            assert_eq!(worker.proto(), Protocol::Arp);
            // Records for unrelated identities are gone, and the worker's
            // own record has been consumed.
            assert!(registry.is_empty());
            assert_eq!(scheduler.state.borrow().watched.len(), 1);
            assert!(scheduler.state.borrow().exits.is_empty());
        }

        #[test]
        fn filter_open_failure_is_fatal() {
            struct BrokenBackend;

            impl CaptureBackend for BrokenBackend {
                fn open(
                    &self,
                    _iface: &InterfaceSnapshot,
                    _filter: crate::domain::FilterKind,
                    _peer: Option<Ipv4Addr>,
                ) -> crate::Result<Box<dyn FilterSocket>> {
                    Err(Error::Io(io::Error::other("no capture device")))
                }
            }

            let mut registry = WorkerRegistry::new();
            registry.insert(WorkerRecord::new(arp_id(), iface(), Protocol::Arp));
            let mut scheduler = TestScheduler::default();
            let (worker_end, _controller_end) = MemoryChannel::pair();

            let result = start_worker(
                &mut registry,
                &arp_id(),
                Box::new(worker_end),
                &BrokenBackend,
                &NoopHardening,
                &mut scheduler,
            );

            assert!(result.is_err());
            assert_eq!(scheduler.state.borrow().exits, vec![ExitStatus::Failure]);
        }

        #[test]
        fn missing_record_is_fatal() {
            let mut registry = WorkerRegistry::new();
            let filter = ReplayFilter::new();
            let backend = ReplayBackend::new(filter);
            let mut scheduler = TestScheduler::default();
            let (worker_end, _controller_end) = MemoryChannel::pair();

            let result = start_worker(
                &mut registry,
                &arp_id(),
                Box::new(worker_end),
                &backend,
                &NoopHardening,
                &mut scheduler,
            );

            assert!(matches!(result, Err(Error::InvalidState(_))));
            assert_eq!(scheduler.state.borrow().exits, vec![ExitStatus::Failure]);
        }
    }

    mod signal_tests {
        use super::*;

        #[test]
        fn terminate_exits_success() {
            let mut scheduler = TestScheduler::default();
            handle_signal(Signal::Terminate, &mut scheduler);
            assert_eq!(scheduler.state.borrow().exits, vec![ExitStatus::Success]);
        }

        #[test]
        fn other_signals_exit_failure() {
            let mut scheduler = TestScheduler::default();
            handle_signal(Signal::Interrupt, &mut scheduler);
            handle_signal(Signal::Other(1), &mut scheduler);
            assert_eq!(
                scheduler.state.borrow().exits,
                vec![ExitStatus::Failure, ExitStatus::Failure]
            );
        }
    }

    mod title_tests {
        use super::*;

        #[test]
        fn title_includes_peer_when_bound() {
            let title = process_title(
                Protocol::Arp,
                &iface(),
                Some(Ipv4Addr::new(10, 0, 0, 1)),
            );
            assert_eq!(title, "[ARP eth0] [10.0.0.1]");
        }

        #[test]
        fn wildcard_title_omits_peer() {
            let title = process_title(Protocol::Bootp, &iface(), None);
            assert_eq!(title, "[BOOTP eth0]");
        }
    }
}
