//! Controller-side lifecycle management and capture dispatch.

use crate::codec::{self, MsgHeader};
use crate::domain::{bare_tag, FrameView, Intent, InterfaceTable, Protocol, StreamId};
use crate::error::Error;
use crate::registry::{WorkerRecord, WorkerRegistry};
use crate::sched::Scheduler;
use crate::sink::PacketSink;
use crate::spawn::Spawner;

/// What a validated command resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A new worker was spawned; carries its process identifier. Useful
    /// for logging and metrics only, never for correctness.
    Spawned(u32),
    /// A Start was accepted against an identity that already has a live
    /// worker; nothing was spawned.
    AlreadyRunning,
    /// The identity's worker was told to terminate and its record removed.
    Stopped,
    /// A data message was forwarded to the identity's worker.
    Forwarded,
}

/// Owns the worker registry and drives worker lifecycles from inbound
/// commands. Lives in the controller process's single-threaded event
/// context; every method is invoked from scheduler callbacks.
pub struct Controller {
    registry: WorkerRegistry,
    spawner: Box<dyn Spawner>,
    scheduler: Box<dyn Scheduler>,
}

impl Controller {
    pub fn new(spawner: Box<dyn Spawner>, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            registry: WorkerRegistry::new(),
            spawner,
            scheduler,
        }
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Reaping exited workers is the embedder's job; it removes records
    /// through this accessor when it observes a child exit.
    pub fn registry_mut(&mut self) -> &mut WorkerRegistry {
        &mut self.registry
    }

    /// Handle one inbound command from the unprivileged side.
    pub fn handle_command(
        &mut self,
        header: &MsgHeader,
        payload: &[u8],
    ) -> crate::Result<CommandOutcome> {
        let (id, proto, intent) = codec::decode(header)?;
        match intent {
            Intent::Start => self.start(id, proto, payload),
            Intent::Stop => self.stop(&id),
            Intent::Data => self.forward(&id, header, payload),
        }
    }

    fn start(
        &mut self,
        id: StreamId,
        proto: Protocol,
        payload: &[u8],
    ) -> crate::Result<CommandOutcome> {
        if self.registry.contains(&id) {
            tracing::debug!("{id}: worker already running");
            return Ok(CommandOutcome::AlreadyRunning);
        }

        // The Start payload is exactly one interface snapshot; any other
        // length aborts the command before a record exists.
        let iface = crate::domain::InterfaceSnapshot::from_bytes(payload)?;
        let mut record = WorkerRecord::new(id, iface, proto);

        let spawned = self.spawner.spawn(&record, true)?;
        if let Err(e) = self.scheduler.watch_read(spawned.channel.raw_handle()) {
            if let Err(te) = self.spawner.terminate(spawned.pid) {
                tracing::warn!("{id}: could not terminate unregistered worker: {te}");
            }
            return Err(e);
        }

        tracing::debug!("{id}: spawned {} worker, pid {}", proto, spawned.pid);
        record.attach(spawned.pid, spawned.channel);
        self.registry.insert(record);
        Ok(CommandOutcome::Spawned(spawned.pid))
    }

    fn stop(&mut self, id: &StreamId) -> crate::Result<CommandOutcome> {
        let mut record = self
            .registry
            .remove(id)
            .ok_or_else(|| Error::InvalidState(format!("stop for unknown stream {id}")))?;

        if let Some(channel) = record.take_channel() {
            self.scheduler.unwatch(channel.raw_handle());
        }
        if let Some(pid) = record.pid() {
            self.spawner.terminate(pid)?;
        }
        tracing::debug!("{id}: worker stopped");
        Ok(CommandOutcome::Stopped)
    }

    fn forward(
        &mut self,
        id: &StreamId,
        header: &MsgHeader,
        payload: &[u8],
    ) -> crate::Result<CommandOutcome> {
        let record = self
            .registry
            .find_mut(id)
            .ok_or_else(|| Error::InvalidState(format!("data for unknown stream {id}")))?;
        let channel = record
            .channel_mut()
            .ok_or_else(|| Error::InvalidState(format!("stream {id} has no control channel")))?;

        let sent = channel.send(header, payload)?;
        if sent == 0 {
            return Err(Error::InvalidState(format!(
                "worker channel for {id} is closed"
            )));
        }
        Ok(CommandOutcome::Forwarded)
    }
}

/// Route one relayed capture message to its protocol handler.
///
/// The interface is resolved against the controller's table, the flags
/// prefix split off, and the frame handed to the sink method selected by
/// the bare command.
pub fn dispatch(
    ifaces: &InterfaceTable,
    sink: &mut dyn PacketSink,
    header: &MsgHeader,
    payload: &[u8],
) -> crate::Result<()> {
    let proto = Protocol::from_tag(bare_tag(header.cmd))?;
    let iface = ifaces.find_by_index(header.id.ifindex).ok_or_else(|| {
        Error::InvalidState(format!("no interface with index {}", header.id.ifindex))
    })?;
    let frame = FrameView::parse(payload)?;
    match proto {
        Protocol::Arp => sink.arp_frame(iface, frame.payload, frame.flags),
        Protocol::Bootp => sink.bootp_frame(iface, frame.payload, frame.flags),
    }
    Ok(())
}
