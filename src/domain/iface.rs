//! Interface snapshots attached to Start commands.

use std::collections::HashMap;

use macaddr::MacAddr6;

use crate::error::Error;

/// Maximum interface name length, including the trailing NUL on the wire.
pub const IFNAMSIZ: usize = 16;

/// A copy of an interface's description, taken by the controller when it
/// starts a worker and carried in the Start payload. The worker operates on
/// this snapshot; it never consults the live interface table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    pub index: u32,
    pub name: String,
    pub hwaddr: MacAddr6,
    pub mtu: u32,
    pub up: bool,
}

impl InterfaceSnapshot {
    /// Exact encoded length. A Start payload of any other length is
    /// rejected outright.
    pub const WIRE_LEN: usize = 4 + IFNAMSIZ + 6 + 4 + 1;

    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        buf[0..4].copy_from_slice(&self.index.to_be_bytes());
        let name = self.name.as_bytes();
        let n = name.len().min(IFNAMSIZ - 1);
        buf[4..4 + n].copy_from_slice(&name[..n]);
        buf[20..26].copy_from_slice(self.hwaddr.as_bytes());
        buf[26..30].copy_from_slice(&self.mtu.to_be_bytes());
        buf[30] = u8::from(self.up);
        buf
    }

    /// Decode a snapshot from a Start payload. The length must match
    /// [`Self::WIRE_LEN`] exactly; a mismatch aborts decoding rather than
    /// truncating.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != Self::WIRE_LEN {
            return Err(Error::PayloadSize {
                expected: Self::WIRE_LEN,
                actual: data.len(),
            });
        }

        let index = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);

        let name_bytes = &data[4..4 + IFNAMSIZ];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(IFNAMSIZ);
        let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();

        let hwaddr = MacAddr6::new(data[20], data[21], data[22], data[23], data[24], data[25]);
        let mtu = u32::from_be_bytes([data[26], data[27], data[28], data[29]]);
        let up = data[30] != 0;

        Ok(Self {
            index,
            name,
            hwaddr,
            mtu,
            up,
        })
    }
}

/// Index-keyed table of known interfaces, owned by the controller's event
/// context. Capture frames are resolved against it before dispatch.
#[derive(Debug, Default)]
pub struct InterfaceTable {
    interfaces: HashMap<u32, InterfaceSnapshot>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, iface: InterfaceSnapshot) {
        self.interfaces.insert(iface.index, iface);
    }

    pub fn find_by_index(&self, index: u32) -> Option<&InterfaceSnapshot> {
        self.interfaces.get(&index)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
