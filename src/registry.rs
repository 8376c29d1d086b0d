//! Registry of live capture workers, keyed by stream identity.

use std::collections::HashMap;

use crate::domain::{InterfaceSnapshot, Protocol, StreamId};
use crate::transport::ControlChannel;

/// Everything the controller tracks about one worker.
///
/// Created when a Start command is validated; the process handle and
/// control channel are attached once the spawn succeeds. The registry
/// exclusively owns records; removal drops the channel with the record.
pub struct WorkerRecord {
    id: StreamId,
    iface: InterfaceSnapshot,
    proto: Protocol,
    pid: Option<u32>,
    channel: Option<Box<dyn ControlChannel>>,
}

impl WorkerRecord {
    pub fn new(id: StreamId, iface: InterfaceSnapshot, proto: Protocol) -> Self {
        Self {
            id,
            iface,
            proto,
            pid: None,
            channel: None,
        }
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn iface(&self) -> &InterfaceSnapshot {
        &self.iface
    }

    pub fn proto(&self) -> Protocol {
        self.proto
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Attach the spawned process's handles.
    pub fn attach(&mut self, pid: u32, channel: Box<dyn ControlChannel>) {
        self.pid = Some(pid);
        self.channel = Some(channel);
    }

    pub fn channel_mut(&mut self) -> Option<&mut (dyn ControlChannel + 'static)> {
        self.channel.as_deref_mut()
    }

    pub fn take_channel(&mut self) -> Option<Box<dyn ControlChannel>> {
        self.channel.take()
    }
}

impl std::fmt::Debug for WorkerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRecord")
            .field("id", &self.id)
            .field("iface", &self.iface.name)
            .field("proto", &self.proto)
            .field("pid", &self.pid)
            .field("channel", &self.channel.as_ref().map(|c| c.raw_handle()))
            .finish()
    }
}

/// Single-owner map from stream identity to worker record.
///
/// Lives in the controller's event-loop context; all mutation happens on
/// scheduler callbacks, so no synchronization is involved.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    records: HashMap<StreamId, WorkerRecord>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &StreamId) -> bool {
        self.records.contains_key(id)
    }

    pub fn find(&self, id: &StreamId) -> Option<&WorkerRecord> {
        self.records.get(id)
    }

    pub fn find_mut(&mut self, id: &StreamId) -> Option<&mut WorkerRecord> {
        self.records.get_mut(id)
    }

    /// Insert a record, replacing any previous record for the identity.
    pub fn insert(&mut self, record: WorkerRecord) {
        self.records.insert(*record.id(), record);
    }

    pub fn remove(&mut self, id: &StreamId) -> Option<WorkerRecord> {
        self.records.remove(id)
    }

    /// Drop every record except the given identity's. A freshly spawned
    /// worker calls this so it retains no handles to unrelated workers.
    pub fn retain_only(&mut self, id: &StreamId) {
        self.records.retain(|key, _| key == id);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &StreamId> {
        self.records.keys()
    }
}
