//! Capture records and length grouping.
//!
//! A [`Capture`] is one observed message: the payload bytes that went into
//! the CRC and the output bytes exactly as they appeared on the wire. The
//! output's integer value depends on the byte order, which is unknown up
//! front, so the raw bytes are kept and decoded on demand.
//!
//! [`CaptureStore`] validates a batch (one output length, one width) and
//! buckets captures by payload length. Differential analysis only works
//! between equal-length messages, so each [`LengthGroup`] is analyzed on its
//! own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::crc::{check_width, output_len};
use crate::error::{Error, Result};

/// Minimum number of distinct captures a group needs to form a difference.
pub const MIN_GROUP_SIZE: usize = 2;

/// Byte order of a multi-byte CRC output on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputOrder {
    /// Most significant byte first.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl OutputOrder {
    /// Both orders, big-endian first.
    pub const ALL: [OutputOrder; 2] = [OutputOrder::BigEndian, OutputOrder::LittleEndian];

    /// Decode up to 8 output bytes into an integer.
    pub fn decode(self, bytes: &[u8]) -> u64 {
        let fold = |acc: u64, &byte: &u8| (acc << 8) | u64::from(byte);
        match self {
            OutputOrder::BigEndian => bytes.iter().fold(0, fold),
            OutputOrder::LittleEndian => bytes.iter().rev().fold(0, fold),
        }
    }

    /// Encode the low `len` bytes of `value`.
    pub fn encode(self, value: u64, len: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..len).map(|i| (value >> (8 * i)) as u8).collect();
        if self == OutputOrder::BigEndian {
            bytes.reverse();
        }
        bytes
    }
}

/// One observed (payload, output) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capture {
    payload: Vec<u8>,
    output: Vec<u8>,
}

impl Capture {
    /// Create a capture from payload bytes and the CRC bytes as transmitted.
    pub fn new(payload: impl Into<Vec<u8>>, output: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            output: output.into(),
        }
    }

    /// Payload bytes the CRC was computed over.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Raw output bytes.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output as an integer under the given byte order.
    pub fn output_value(&self, order: OutputOrder) -> u64 {
        order.decode(&self.output)
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Distinct captures sharing one payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthGroup {
    length: usize,
    captures: Vec<Capture>,
}

impl LengthGroup {
    fn new(length: usize) -> Self {
        Self {
            length,
            captures: Vec::new(),
        }
    }

    fn insert(&mut self, capture: Capture) {
        debug_assert_eq!(capture.len(), self.length);
        if self.captures.contains(&capture) {
            trace!(length = self.length, "Dropping duplicate capture");
        } else {
            self.captures.push(capture);
        }
    }

    /// Payload length shared by every capture.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Captures in insertion order.
    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    /// Number of distinct captures.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Whether the group holds no captures.
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Whether there are enough captures to form a difference.
    pub fn is_analyzable(&self) -> bool {
        self.captures.len() >= MIN_GROUP_SIZE
    }
}

/// A validated batch of captures, grouped by payload length.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    width: u32,
    output_len: usize,
    groups: BTreeMap<usize, LengthGroup>,
}

impl CaptureStore {
    /// Group loose captures by payload length.
    ///
    /// # Errors
    ///
    /// - `NoCaptures` if `captures` is empty
    /// - `UnsupportedWidth` if the width is outside `1..=64`
    /// - `WidthMismatch` if output lengths disagree
    pub fn from_captures(captures: Vec<Capture>, width: Option<u32>) -> Result<Self> {
        let (width, output_len) = resolve_width(&captures, width)?;
        let mut store = Self {
            width,
            output_len,
            groups: BTreeMap::new(),
        };
        for capture in captures {
            store.insert(capture);
        }
        Ok(store)
    }

    /// Accept captures the caller already grouped.
    ///
    /// Declared groups that share a payload length are merged.
    ///
    /// # Errors
    ///
    /// As [`from_captures`](Self::from_captures), plus `LengthMismatch` if a
    /// declared group mixes payload lengths.
    pub fn from_groups(groups: Vec<Vec<Capture>>, width: Option<u32>) -> Result<Self> {
        let flat: Vec<&Capture> = groups.iter().flatten().collect();
        let (width, output_len) = resolve_width(flat.iter().copied(), width)?;

        for (index, group) in groups.iter().enumerate() {
            let Some(first) = group.first() else {
                continue;
            };
            if let Some(bad) = group.iter().find(|c| c.len() != first.len()) {
                return Err(Error::LengthMismatch {
                    group: index,
                    expected: first.len(),
                    found: bad.len(),
                });
            }
        }

        let mut store = Self {
            width,
            output_len,
            groups: BTreeMap::new(),
        };
        for capture in groups.into_iter().flatten() {
            store.insert(capture);
        }
        Ok(store)
    }

    fn insert(&mut self, capture: Capture) {
        self.groups
            .entry(capture.len())
            .or_insert_with(|| LengthGroup::new(capture.len()))
            .insert(capture);
    }

    /// CRC width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Groups in ascending payload length.
    pub fn groups(&self) -> impl Iterator<Item = &LengthGroup> {
        self.groups.values()
    }

    /// The group for one payload length.
    pub fn group(&self, length: usize) -> Option<&LengthGroup> {
        self.groups.get(&length)
    }

    /// Distinct payload lengths, ascending.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.keys().copied()
    }

    /// Distinct captures recorded for a payload length (0 if none).
    pub fn capture_count(&self, length: usize) -> usize {
        self.groups.get(&length).map_or(0, LengthGroup::len)
    }

    /// Every distinct capture, grouped by ascending length.
    pub fn captures(&self) -> impl Iterator<Item = &Capture> {
        self.groups.values().flat_map(|g| g.captures.iter())
    }

    /// Whether the batch holds only one payload length.
    pub fn is_single_length(&self) -> bool {
        self.groups.len() == 1
    }
}

/// Work out the CRC width and output length for a batch.
///
/// An explicit width fixes the output length to `ceil(width / 8)`; otherwise
/// the first capture's output length decides and the width is eight bits per
/// byte.
fn resolve_width<'a>(
    captures: impl IntoIterator<Item = &'a Capture>,
    declared: Option<u32>,
) -> Result<(u32, usize)> {
    let mut captures = captures.into_iter().enumerate().peekable();
    let Some((_, first)) = captures.peek() else {
        return Err(Error::NoCaptures);
    };

    let (width, expected) = match declared {
        Some(width) => {
            check_width(width)?;
            (width, output_len(width))
        }
        None => {
            let len = first.output().len();
            let width = u32::try_from(len * 8).unwrap_or(u32::MAX);
            check_width(width)?;
            (width, len)
        }
    };

    for (index, capture) in captures {
        if capture.output().len() != expected {
            return Err(Error::WidthMismatch {
                index,
                expected,
                found: capture.output().len(),
            });
        }
    }

    Ok((width, expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_order_decode() {
        assert_eq!(OutputOrder::BigEndian.decode(&[0xFD, 0x0E]), 0xFD0E);
        assert_eq!(OutputOrder::LittleEndian.decode(&[0xFD, 0x0E]), 0x0EFD);
        assert_eq!(OutputOrder::BigEndian.decode(&[0x9D]), 0x9D);
        assert_eq!(
            OutputOrder::LittleEndian.decode(&[1, 2, 3, 4, 5, 6, 7, 8]),
            0x0807_0605_0403_0201
        );
    }

    #[test]
    fn output_order_encode_inverts_decode() {
        for order in OutputOrder::ALL {
            let bytes = order.encode(0xCAFE_BABE, 4);
            assert_eq!(order.decode(&bytes), 0xCAFE_BABE);
        }
        assert_eq!(OutputOrder::BigEndian.encode(0x1234, 2), vec![0x12, 0x34]);
        assert_eq!(OutputOrder::LittleEndian.encode(0x1234, 2), vec![0x34, 0x12]);
    }

    #[test]
    fn width_inferred_from_output_length() {
        let store = CaptureStore::from_captures(
            vec![Capture::new([1, 2, 3], [0xAA, 0xBB])],
            None,
        )
        .unwrap();
        assert_eq!(store.width(), 16);
        assert_eq!(store.output_len(), 2);
    }

    #[test]
    fn explicit_narrow_width() {
        let store =
            CaptureStore::from_captures(vec![Capture::new([1], [0x0A, 0xBC])], Some(12)).unwrap();
        assert_eq!(store.width(), 12);
        assert_eq!(store.output_len(), 2);
    }

    #[test]
    fn mixed_output_lengths_rejected() {
        let result = CaptureStore::from_captures(
            vec![
                Capture::new([1, 2], [0x01, 0x02]),
                Capture::new([3, 4], [0x01, 0x02]),
                Capture::new([5, 6], [0x01, 0x02, 0x03, 0x04]),
            ],
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            Error::WidthMismatch {
                index: 2,
                expected: 2,
                found: 4
            }
        );
    }

    #[test]
    fn declared_width_must_fit_output() {
        let result = CaptureStore::from_captures(vec![Capture::new([1], [0x01, 0x02])], Some(32));
        assert!(matches!(
            result,
            Err(Error::WidthMismatch {
                expected: 4,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn unsupported_widths() {
        let result = CaptureStore::from_captures(vec![Capture::new([1], [0u8; 9])], None);
        assert_eq!(result.unwrap_err(), Error::UnsupportedWidth { width: 72 });

        let result = CaptureStore::from_captures(vec![Capture::new([1], Vec::<u8>::new())], None);
        assert_eq!(result.unwrap_err(), Error::UnsupportedWidth { width: 0 });
    }

    #[test]
    fn empty_batch_rejected() {
        assert_eq!(
            CaptureStore::from_captures(Vec::new(), None).unwrap_err(),
            Error::NoCaptures
        );
        assert_eq!(
            CaptureStore::from_groups(vec![Vec::new()], None).unwrap_err(),
            Error::NoCaptures
        );
    }

    #[test]
    fn groups_by_payload_length() {
        let store = CaptureStore::from_captures(
            vec![
                Capture::new([1, 2, 3], [0x10]),
                Capture::new([4, 5], [0x20]),
                Capture::new([6, 7, 8], [0x30]),
                Capture::new([9, 9, 9], [0x40]),
            ],
            None,
        )
        .unwrap();

        assert_eq!(store.lengths().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(store.capture_count(3), 3);
        assert_eq!(store.capture_count(2), 1);
        assert_eq!(store.capture_count(7), 0);
        assert!(store.group(3).unwrap().is_analyzable());
        assert!(!store.group(2).unwrap().is_analyzable());
        assert!(!store.is_single_length());
    }

    #[test]
    fn duplicate_captures_collapse() {
        let store = CaptureStore::from_captures(
            vec![
                Capture::new([1, 2], [0x10]),
                Capture::new([1, 2], [0x10]),
            ],
            None,
        )
        .unwrap();
        assert_eq!(store.capture_count(2), 1);
        assert!(!store.group(2).unwrap().is_analyzable());
    }

    #[test]
    fn declared_group_with_mixed_lengths_rejected() {
        let result = CaptureStore::from_groups(
            vec![
                vec![Capture::new([1, 2], [0]), Capture::new([3, 4], [0])],
                vec![Capture::new([1, 2, 3], [0]), Capture::new([4, 5], [0])],
            ],
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            Error::LengthMismatch {
                group: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn declared_groups_of_same_length_merge() {
        let store = CaptureStore::from_groups(
            vec![
                vec![Capture::new([1, 2], [0])],
                vec![Capture::new([3, 4], [1])],
            ],
            None,
        )
        .unwrap();
        assert!(store.is_single_length());
        assert_eq!(store.capture_count(2), 2);
    }
}
