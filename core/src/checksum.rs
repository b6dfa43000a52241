//! Simple-checksum detection for 8-bit outputs.
//!
//! Plenty of protocols that advertise a "CRC-8" actually send a byte sum or
//! an XOR of all bytes. With only a handful of short captures a real CRC
//! search can still turn up a polynomial that happens to fit, so the 8-bit
//! path also checks these models and flags the group when one of them
//! explains every capture.
//!
//! The test is the same cancellation as for CRCs: `fold(payload) ^ output`
//! must be one constant across the captures.

use serde::{Deserialize, Serialize};

use crate::capture::{Capture, OutputOrder};

/// Width the heuristic applies to.
pub const CHECKSUM_WIDTH: u32 = 8;

/// Non-polynomial checksum families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecksumKind {
    /// Sum of all bytes modulo 256.
    Sum,
    /// XOR of all bytes.
    Xor,
}

impl ChecksumKind {
    /// Fold a payload down to one byte.
    pub fn fold(self, payload: &[u8]) -> u8 {
        match self {
            ChecksumKind::Sum => payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)),
            ChecksumKind::Xor => payload.iter().fold(0u8, |acc, &b| acc ^ b),
        }
    }
}

/// A simple checksum that explains every capture it was tested on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleChecksum {
    /// Which fold.
    pub kind: ChecksumKind,
    /// Constant XORed onto the fold.
    pub xor_out: u8,
}

impl SimpleChecksum {
    /// Checksum of `payload`.
    pub fn compute(&self, payload: &[u8]) -> u8 {
        self.kind.fold(payload) ^ self.xor_out
    }
}

/// Test the captures against each simple checksum, additive first.
///
/// Returns `None` for widths other than 8 or fewer than two captures.
pub fn detect<'a>(
    width: u32,
    captures: impl IntoIterator<Item = &'a Capture> + Clone,
) -> Option<SimpleChecksum> {
    if width != CHECKSUM_WIDTH || captures.clone().into_iter().nth(1).is_none() {
        return None;
    }
    [ChecksumKind::Sum, ChecksumKind::Xor]
        .into_iter()
        .find_map(|kind| constant_residual(kind, captures.clone()))
}

fn constant_residual<'a>(
    kind: ChecksumKind,
    captures: impl IntoIterator<Item = &'a Capture>,
) -> Option<SimpleChecksum> {
    let mut residuals = captures
        .into_iter()
        .map(|c| kind.fold(c.payload()) ^ c.output_value(OutputOrder::BigEndian) as u8);
    let first = residuals.next()?;
    residuals.all(|r| r == first).then_some(SimpleChecksum {
        kind,
        xor_out: first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures(pairs: Vec<(Vec<u8>, u8)>) -> Vec<Capture> {
        pairs
            .into_iter()
            .map(|(payload, out)| Capture::new(payload, [out]))
            .collect()
    }

    #[test]
    fn plain_byte_sum() {
        let caps = captures(vec![
            (vec![1, 2, 3], 6),
            (vec![4, 5, 6], 15),
            (vec![7, 8, 9], 24),
        ]);
        assert_eq!(
            detect(8, &caps),
            Some(SimpleChecksum {
                kind: ChecksumKind::Sum,
                xor_out: 0
            })
        );
    }

    #[test]
    fn inverted_sum() {
        let caps = captures(vec![
            (vec![0x00, 0xF0, 0x54, 0x01, 0x84, 0x99], 0x9D),
            (vec![0x00, 0xF0, 0x2E, 0x01, 0x0A, 0x40], 0x96),
        ]);
        let found = detect(8, &caps).unwrap();
        assert_eq!(found.kind, ChecksumKind::Sum);
        assert_eq!(found.xor_out, 0xFF);
        for c in &caps {
            assert_eq!(found.compute(c.payload()), c.output()[0]);
        }
    }

    #[test]
    fn xor_fold() {
        let caps = captures(vec![
            (vec![0x12, 0x34], 0x12 ^ 0x34 ^ 0x5A),
            (vec![0xFF, 0x01], 0xFE ^ 0x5A),
        ]);
        assert_eq!(
            detect(8, &caps),
            Some(SimpleChecksum {
                kind: ChecksumKind::Xor,
                xor_out: 0x5A
            })
        );
    }

    #[test]
    fn crc_data_not_flagged() {
        let caps = captures(vec![
            (vec![1, 2, 3], 0x48),
            (vec![4, 5, 6], 0x7E),
            (vec![7, 8, 9], 0x2C),
        ]);
        assert_eq!(detect(8, &caps), None);
    }

    #[test]
    fn only_for_eight_bits_and_two_captures() {
        let caps = captures(vec![(vec![1, 2, 3], 6), (vec![4, 5, 6], 15)]);
        assert_eq!(detect(16, &caps), None);
        assert_eq!(detect(8, &caps[..1]), None);
    }
}
