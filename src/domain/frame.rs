//! The flags-prefixed frame exchanged between worker and controller.

use crate::error::Error;

/// Maximum raw link-layer frame length relayed per message.
pub const MAX_FRAME_LEN: usize = 1514;

/// Width of the flags prefix on the wire.
pub const FLAGS_LEN: usize = 1;

/// Per-frame relay flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// The filter buffer held no further frames when this one was read.
    pub const END_OF_BATCH: FrameFlags = FrameFlags(0x01);

    pub fn empty() -> Self {
        FrameFlags(0)
    }

    pub fn from_bits(bits: u8) -> Self {
        FrameFlags(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: FrameFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FrameFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FrameFlags) {
        self.0 &= !other.0;
    }

    pub fn end_of_batch(self) -> bool {
        self.contains(FrameFlags::END_OF_BATCH)
    }
}

/// A capture message split into its flags prefix and raw frame bytes.
///
/// The wire unit is the one-byte flags field immediately followed by the
/// frame; parsing into this view keeps the offset arithmetic in one place.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameView<'a> {
    pub flags: FrameFlags,
    pub payload: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Split a relayed capture payload into flags and frame bytes.
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        if data.len() < FLAGS_LEN {
            return Err(Error::PayloadSize {
                expected: FLAGS_LEN,
                actual: data.len(),
            });
        }
        let payload = &data[FLAGS_LEN..];
        if payload.len() > MAX_FRAME_LEN {
            return Err(Error::PayloadSize {
                expected: FLAGS_LEN + MAX_FRAME_LEN,
                actual: data.len(),
            });
        }
        Ok(Self {
            flags: FrameFlags::from_bits(data[0]),
            payload,
        })
    }

    /// Build the wire form: flags byte followed by the frame.
    pub fn encode(flags: FrameFlags, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FLAGS_LEN + payload.len());
        buf.push(flags.bits());
        buf.extend_from_slice(payload);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod flags_tests {
        use super::*;

        #[test]
        fn insert_and_remove() {
            let mut flags = FrameFlags::empty();
            assert!(!flags.end_of_batch());
            flags.insert(FrameFlags::END_OF_BATCH);
            assert!(flags.end_of_batch());
            flags.remove(FrameFlags::END_OF_BATCH);
            assert!(!flags.end_of_batch());
        }

        #[test]
        fn bits_roundtrip() {
            let flags = FrameFlags::from_bits(0x01);
            assert_eq!(FrameFlags::from_bits(flags.bits()), flags);
        }
    }

    mod view_tests {
        use super::*;

        #[test]
        fn parse_splits_flags_and_payload() {
            let wire = FrameView::encode(FrameFlags::END_OF_BATCH, &[0xde, 0xad]);
            let view = FrameView::parse(&wire).unwrap();
            assert!(view.flags.end_of_batch());
            assert_eq!(view.payload, &[0xde, 0xad]);
        }

        #[test]
        fn flags_only_message_has_empty_payload() {
            let view = FrameView::parse(&[0x00]).unwrap();
            assert_eq!(view.flags, FrameFlags::empty());
            assert!(view.payload.is_empty());
        }

        #[test]
        fn empty_message_rejected() {
            assert!(matches!(
                FrameView::parse(&[]),
                Err(Error::PayloadSize {
                    expected: FLAGS_LEN,
                    actual: 0
                })
            ));
        }

        #[test]
        fn oversize_frame_rejected() {
            let wire = FrameView::encode(FrameFlags::empty(), &vec![0u8; MAX_FRAME_LEN + 1]);
            assert!(FrameView::parse(&wire).is_err());
        }
    }
}
