//! Per-length XOR-out solving.
//!
//! Once polynomial and reflection are fixed, every capture gives
//!
//! ```text
//! residual = observed ^ crc0(payload)
//! ```
//!
//! For a real CRC over fixed-length messages this residual folds together
//! init, XOR-in, any constant header or padding and the true XOR-out, so it
//! is the same for every capture of that length. It generally differs
//! between lengths, which is why it is never carried across groups.

use serde::{Deserialize, Serialize};

use crate::capture::LengthGroup;
use crate::search::CandidateParameters;

/// Outcome of solving a group's XOR-out for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XorOut {
    /// Every capture leaves the same residual.
    Constant(u64),
    /// Captures disagree; the distinct residuals in first-seen order.
    Inconsistent(Vec<u64>),
}

impl XorOut {
    /// The constant, if there is one.
    pub fn constant(&self) -> Option<u64> {
        match self {
            XorOut::Constant(value) => Some(*value),
            XorOut::Inconsistent(_) => None,
        }
    }
}

/// Solve the XOR-out constant of `group` under `candidate`.
///
/// An empty group yields `Constant(0)`.
pub fn solve(candidate: &CandidateParameters, group: &LengthGroup) -> XorOut {
    let mut residuals: Vec<u64> = Vec::new();
    for capture in group.captures() {
        let residual =
            capture.output_value(candidate.output_order) ^ candidate.raw_crc(capture.payload());
        if !residuals.contains(&residual) {
            residuals.push(residual);
        }
    }

    match residuals.as_slice() {
        [] => XorOut::Constant(0),
        [single] => XorOut::Constant(*single),
        _ => XorOut::Inconsistent(residuals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Capture, CaptureStore, OutputOrder};
    use crate::crc::{CrcModel, Reflection};

    fn candidate(polynomial: u64, reflection: Reflection) -> CandidateParameters {
        CandidateParameters {
            width: 16,
            polynomial,
            reflection,
            output_order: OutputOrder::BigEndian,
        }
    }

    #[test]
    fn init_and_header_fold_into_one_constant() {
        let model = CrcModel {
            width: 16,
            polynomial: 0x8005,
            init: 0xFFFF,
            reflection: Reflection::Both,
            xor_out: 0,
        };
        let header = [0xA5u8, 0x10];
        let captures = [b"\x01\x02\x03", b"\x70\x71\x72", b"\xEE\x00\x10"]
            .iter()
            .map(|body| {
                let framed = [&header[..], &body[..]].concat();
                Capture::new(body.to_vec(), model.compute(&framed).to_be_bytes()[6..].to_vec())
            })
            .collect();
        let store = CaptureStore::from_captures(captures, None).unwrap();
        let group = store.group(3).unwrap();

        let solved = solve(&candidate(0x8005, Reflection::Both), group);
        let xor_out = solved.constant().expect("constant residual");

        let effective = candidate(0x8005, Reflection::Both).model(xor_out);
        for capture in group.captures() {
            assert_eq!(
                effective.compute(capture.payload()),
                capture.output_value(OutputOrder::BigEndian)
            );
        }
    }

    #[test]
    fn wrong_polynomial_is_inconsistent() {
        let model = CrcModel {
            width: 16,
            polynomial: 0x1021,
            init: 0,
            reflection: Reflection::None,
            xor_out: 0x1234,
        };
        let captures = [b"\x01\x02", b"\x03\x04", b"\x05\x06"]
            .iter()
            .map(|p| Capture::new(p.to_vec(), OutputOrder::BigEndian.encode(model.compute(*p), 2)))
            .collect();
        let store = CaptureStore::from_captures(captures, None).unwrap();
        let group = store.group(2).unwrap();

        assert_eq!(
            solve(&candidate(0x1021, Reflection::None), group),
            XorOut::Constant(0x1234)
        );

        let wrong = solve(&candidate(0x8005, Reflection::None), group);
        assert!(matches!(wrong, XorOut::Inconsistent(ref r) if r.len() > 1));
        assert_eq!(wrong.constant(), None);
    }
}
