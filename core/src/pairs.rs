//! XOR-difference pairs between captures of one length group.
//!
//! For two equal-length messages `a` and `b` protected by the same CRC:
//!
//! ```text
//! out(a) ^ out(b) = crc0(a ^ b)
//! ```
//!
//! where `crc0` runs with zero init and zero XOR-out. The initial value, any
//! XOR-in, constant header or padding bytes and the XOR-out all cancel, which
//! leaves only the polynomial and the reflection convention to find.
//!
//! The pair set is split in two. Seed pairs (the first capture against every
//! other one) are what the sweep prunes with; cross pairs (every remaining
//! combination) only verify the survivors.

use serde::{Deserialize, Serialize};

use crate::capture::{Capture, LengthGroup, OutputOrder};

/// Two captures with identical payloads but different outputs.
///
/// No CRC maps the zero difference to a non-zero one, so the group cannot
/// come from a single CRC over the payload alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateInput {
    /// Index of the first capture within its group.
    pub first: usize,
    /// Index of the second capture within its group.
    pub second: usize,
}

/// The difference between two captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferencePair {
    first: usize,
    second: usize,
    delta: Vec<u8>,
    delta_output: Vec<u8>,
    /// Index of the first non-zero delta byte (`delta.len()` if none).
    offset: usize,
}

impl DifferencePair {
    /// Difference of captures `first` and `second` (indices within the group).
    pub fn new(first: (usize, &Capture), second: (usize, &Capture)) -> Self {
        let (i, a) = first;
        let (j, b) = second;
        debug_assert_eq!(a.len(), b.len());

        let delta: Vec<u8> = xor_bytes(a.payload(), b.payload());
        let offset = delta.iter().position(|&x| x != 0).unwrap_or(delta.len());

        Self {
            first: i,
            second: j,
            delta,
            delta_output: xor_bytes(a.output(), b.output()),
            offset,
        }
    }

    /// Group indices of the two captures.
    pub fn indices(&self) -> (usize, usize) {
        (self.first, self.second)
    }

    /// Byte-wise XOR of the two payloads.
    pub fn delta(&self) -> &[u8] {
        &self.delta
    }

    /// The delta with leading zero bytes stripped.
    ///
    /// A zeroed register stays zero while it consumes zero bytes, whatever
    /// the polynomial or reflection, so these bytes never need stepping.
    pub fn effective_delta(&self) -> &[u8] {
        &self.delta[self.offset..]
    }

    /// XOR of the two outputs under a byte order.
    ///
    /// Decoding commutes with XOR, so this equals
    /// `a.output_value(order) ^ b.output_value(order)`.
    pub fn delta_output(&self, order: OutputOrder) -> u64 {
        order.decode(&self.delta_output)
    }

    /// Whether the payloads were identical.
    pub fn is_zero_delta(&self) -> bool {
        self.offset == self.delta.len()
    }

    fn is_degenerate(&self) -> bool {
        self.is_zero_delta() && self.delta_output.iter().any(|&x| x != 0)
    }
}

fn xor_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

/// Seed and cross difference pairs for one group.
#[derive(Debug, Clone)]
pub struct PairSet {
    seed: Vec<DifferencePair>,
    cross: Vec<DifferencePair>,
}

impl PairSet {
    /// Build every pair for `group`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DegenerateInput`] found among all pairs.
    pub fn build(group: &LengthGroup) -> Result<Self, DegenerateInput> {
        let captures = group.captures();
        let mut seed = Vec::with_capacity(captures.len().saturating_sub(1));
        let mut cross = Vec::new();

        for (i, a) in captures.iter().enumerate() {
            for (j, b) in captures.iter().enumerate().skip(i + 1) {
                let pair = DifferencePair::new((i, a), (j, b));
                if pair.is_degenerate() {
                    return Err(DegenerateInput {
                        first: i,
                        second: j,
                    });
                }
                if i == 0 {
                    seed.push(pair);
                } else {
                    cross.push(pair);
                }
            }
        }

        // Cheapest rejections first.
        seed.sort_by_key(|p| p.effective_delta().len());

        Ok(Self { seed, cross })
    }

    /// The reference capture against every other capture.
    pub fn seed(&self) -> &[DifferencePair] {
        &self.seed
    }

    /// Every pair not involving the reference capture.
    pub fn cross(&self) -> &[DifferencePair] {
        &self.cross
    }

    /// Seed then cross pairs: all `n·(n−1)/2` combinations.
    pub fn all(&self) -> impl Iterator<Item = &DifferencePair> {
        self.seed.iter().chain(&self.cross)
    }

    /// Total number of pairs.
    pub fn len(&self) -> usize {
        self.seed.len() + self.cross.len()
    }

    /// Whether there are no pairs (fewer than two captures).
    pub fn is_empty(&self) -> bool {
        self.seed.is_empty()
    }
}
