//! Beagle Core - differential CRC parameter recovery.
//!
//! Given captured messages and the CRC bytes that came with them, recover
//! the CRC's width, polynomial, reflection convention and output byte
//! order, plus a per-length XOR-out constant that reproduces every capture.
//!
//! # How it works
//!
//! For two equal-length messages `a` and `b` under the same CRC,
//!
//! ```text
//! out(a) ^ out(b) = crc0(a ^ b)
//! ```
//!
//! where `crc0` has zero init and zero XOR-out. Init, XOR-out and any fixed
//! header or trailer cancel, so the polynomial and reflection can be found
//! without knowing them. Once those are fixed, the remaining constant is
//! solved per payload length.
//!
//! - [`capture`]: validation and grouping by payload length
//! - [`pairs`]: difference pairs within a group
//! - [`search`]: the polynomial / reflection / byte-order sweep
//! - [`xorout`]: per-length constant solving
//! - [`checksum`]: 8-bit sum and XOR checksum detection
//! - [`report`]: per-group and batch results
//! - [`catalog`]: known algorithms, for naming candidates and for the
//!   catalog-first search modes
//!
//! # Constraints
//!
//! This library does NOT:
//! - Read files, sockets or serial ports
//! - Generate code for a recovered CRC
//! - Recover CRCs over messages of varying framing within one length
//!
//! # Example
//!
//! ```
//! use beagle_core::{search, Capture, GroupStatus, OutputOrder, Reflection, SearchRequest};
//!
//! let captures = vec![
//!     Capture::new(
//!         [165, 16, 2, 7, 85, 163, 209, 114, 21, 131, 143, 144, 52, 187, 183, 142, 180, 39, 169, 76],
//!         [253, 14],
//!     ),
//!     Capture::new(
//!         [165, 16, 2, 7, 140, 39, 242, 202, 181, 209, 220, 248, 156, 112, 66, 128, 236, 187, 35, 176],
//!         [90, 38],
//!     ),
//!     Capture::new(
//!         [165, 16, 2, 7, 113, 105, 30, 118, 164, 96, 43, 198, 84, 170, 123, 76, 107, 225, 133, 194],
//!         [248, 236],
//!     ),
//! ];
//!
//! let report = search(&SearchRequest::from_captures(captures)).unwrap();
//! let group = report.group(20).unwrap();
//!
//! let GroupStatus::Solved { candidate, xor_out } = group.status else {
//!     panic!("expected a unique solution");
//! };
//! assert_eq!(candidate.polynomial, 0x1021);
//! assert_eq!(candidate.reflection, Reflection::None);
//! assert_eq!(candidate.output_order, OutputOrder::LittleEndian);
//! assert_eq!(xor_out, 0xCACA);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capture;
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod crc;
pub mod engine;
pub mod error;
pub mod pairs;
pub mod report;
pub mod search;
pub mod xorout;

// Re-export main types at crate root
pub use capture::{Capture, CaptureStore, LengthGroup, OutputOrder};
pub use checksum::{ChecksumKind, SimpleChecksum};
pub use config::{SearchConfig, SearchMode};
pub use crc::{CrcModel, Reflection, MAX_WIDTH};
pub use engine::{search, SearchRequest};
pub use error::{Error, Result};
pub use report::{Coverage, GroupReport, GroupStatus, SearchReport};
pub use search::{CancelToken, CandidateParameters};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    fn documented_captures() -> Vec<Capture> {
        vec![
            Capture::new(
                vec![
                    165, 16, 2, 7, 85, 163, 209, 114, 21, 131, 143, 144, 52, 187, 183, 142, 180,
                    39, 169, 76,
                ],
                vec![253, 14],
            ),
            Capture::new(
                vec![
                    165, 16, 2, 7, 140, 39, 242, 202, 181, 209, 220, 248, 156, 112, 66, 128, 236,
                    187, 35, 176,
                ],
                vec![90, 38],
            ),
            Capture::new(
                vec![
                    165, 16, 2, 7, 113, 105, 30, 118, 164, 96, 43, 198, 84, 170, 123, 76, 107, 225,
                    133, 194,
                ],
                vec![248, 236],
            ),
        ]
    }

    #[test]
    fn documented_example_solves_uniquely() {
        let captures = documented_captures();
        let report = search(&SearchRequest::from_captures(captures.clone())).unwrap();

        assert_eq!(report.width, 16);
        assert!(report.is_single_length());
        let group = report.group(20).unwrap();
        assert_eq!(group.captures, 3);
        assert!(group.simple_checksum.is_none());

        let model = group.model().expect("solved");
        assert_eq!(model.polynomial, 0x1021);
        assert_eq!(model.reflection, Reflection::None);
        assert_eq!(model.xor_out, 0xCACA);
        assert_eq!(group.output_order(), Some(OutputOrder::LittleEndian));

        for capture in &captures {
            assert_eq!(
                model.compute(capture.payload()),
                capture.output_value(OutputOrder::LittleEndian)
            );
        }

        let family: Vec<&str> = catalog::lookup(&group.status.candidates()[0])
            .map(|a| a.name)
            .collect();
        assert!(family.contains(&"CRC-16/XMODEM"));
    }

    #[test]
    fn big_endian_reading_has_no_solution() {
        let request = SearchRequest::from_captures(documented_captures())
            .with_output_order(OutputOrder::BigEndian);
        let report = search(&request).unwrap();
        assert_eq!(report.groups[0].status, GroupStatus::NoSolution);
    }

    #[test]
    fn inverted_byte_sum_is_flagged() {
        let captures = vec![
            Capture::new(vec![0x00, 0xF0, 0x54, 0x01, 0x84, 0x99], vec![0x9D]),
            Capture::new(vec![0x00, 0xF0, 0x2E, 0x01, 0x0A, 0x40], vec![0x96]),
        ];
        let report = search(&SearchRequest::from_captures(captures)).unwrap();
        let group = report.group(6).unwrap();

        let expected = SimpleChecksum {
            kind: ChecksumKind::Sum,
            xor_out: 0xFF,
        };
        assert_eq!(group.simple_checksum, Some(expected));
        assert!(group.likely_simple_checksum());
        assert_eq!(report.batch_checksum, Some(expected));

        // Two captures leave room for a coincidental polynomial.
        let model = group.model().expect("solved");
        assert_eq!(model.polynomial, 0x03);
        assert_eq!(model.xor_out, 0x93);
    }

    #[test]
    fn lone_capture_is_insufficient() {
        let report = search(&SearchRequest::from_captures(vec![Capture::new(
            vec![1, 2, 3],
            vec![0x12, 0x34],
        )]))
        .unwrap();
        assert_eq!(report.groups[0].status, GroupStatus::InsufficientData);
        assert!(report.consensus().is_empty());
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
