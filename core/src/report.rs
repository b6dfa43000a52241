//! Search results.
//!
//! One [`GroupReport`] per distinct payload length, gathered in a
//! [`SearchReport`]. A group's status never depends on its siblings: a batch
//! can hold a solved group next to a degenerate one and an insufficient one.

use serde::{Deserialize, Serialize};

use crate::capture::OutputOrder;
use crate::checksum::SimpleChecksum;
use crate::crc::CrcModel;
use crate::pairs::DegenerateInput;
use crate::search::CandidateParameters;

/// Outcome of analyzing one length group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatus {
    /// Fewer than two distinct captures; no search was attempted.
    InsufficientData,

    /// Identical payloads produced different outputs; no search was attempted.
    DegenerateInput(DegenerateInput),

    /// No polynomial explains the differences.
    ///
    /// Usually a wrong width, framing that varies between messages, or
    /// data that is not a CRC at all.
    NoSolution,

    /// Several candidates fit, or the candidate limit cut the list short;
    /// more captures or lengths are needed.
    AmbiguousSolution {
        /// Sorted candidates.
        candidates: Vec<CandidateParameters>,
        /// The candidate limit cut the list short.
        truncated: bool,
    },

    /// Exactly one candidate fits and the XOR-out is consistent.
    Solved {
        /// The recovered parameters.
        candidate: CandidateParameters,
        /// Per-length XOR-out constant.
        xor_out: u64,
    },

    /// Exactly one candidate fits the differences but the residuals disagree.
    InconsistentXorOut {
        /// The unique candidate.
        candidate: CandidateParameters,
        /// Distinct residuals observed.
        residuals: Vec<u64>,
    },

    /// The search was cancelled or ran past its deadline.
    Cancelled,
}

impl GroupStatus {
    /// Candidates behind this status (empty when no search produced any).
    pub fn candidates(&self) -> &[CandidateParameters] {
        match self {
            GroupStatus::AmbiguousSolution { candidates, .. } => candidates,
            GroupStatus::Solved { candidate, .. }
            | GroupStatus::InconsistentXorOut { candidate, .. } => std::slice::from_ref(candidate),
            _ => &[],
        }
    }

    /// Whether the group solved uniquely.
    pub fn is_solved(&self) -> bool {
        matches!(self, GroupStatus::Solved { .. })
    }

    /// Whether a sweep ran to completion for this group.
    pub fn was_searched(&self) -> bool {
        !matches!(
            self,
            GroupStatus::InsufficientData
                | GroupStatus::DegenerateInput(_)
                | GroupStatus::Cancelled
        )
    }
}

/// Which polynomials a group's candidates were drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coverage {
    /// Every polynomial of the width was swept.
    Exhaustive,
    /// Only polynomials of known algorithms were tried.
    ///
    /// `NoSolution` then means no known algorithm fits, not that no CRC
    /// does, and a `Solved` status is unique among known algorithms only.
    Catalog,
}

/// Result for one payload length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    /// Payload length in bytes.
    pub length: usize,
    /// Distinct captures of this length.
    pub captures: usize,
    /// Outcome.
    pub status: GroupStatus,
    /// Polynomials behind `status`; `None` when no search ran.
    pub coverage: Option<Coverage>,
    /// Set when a plain sum or XOR checksum explains the group (8-bit only).
    ///
    /// This is independent of `status`: a group can be both solved and
    /// flagged, in which case the CRC result is likely a coincidence.
    pub simple_checksum: Option<SimpleChecksum>,
}

impl GroupReport {
    /// The model reproducing this group's outputs, if solved.
    pub fn model(&self) -> Option<CrcModel> {
        match &self.status {
            GroupStatus::Solved { candidate, xor_out } => Some(candidate.model(*xor_out)),
            _ => None,
        }
    }

    /// Output byte order of the solution, if solved.
    pub fn output_order(&self) -> Option<OutputOrder> {
        match &self.status {
            GroupStatus::Solved { candidate, .. } => Some(candidate.output_order),
            _ => None,
        }
    }

    /// Whether the candidates come from known algorithms only.
    pub fn is_catalog_only(&self) -> bool {
        self.coverage == Some(Coverage::Catalog)
    }

    /// Whether the group looks like a simple checksum rather than a CRC.
    pub fn likely_simple_checksum(&self) -> bool {
        self.simple_checksum.is_some()
    }
}

/// Result of a whole search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// CRC width in bits.
    pub width: u32,
    /// Output length in bytes.
    pub output_len: usize,
    /// One report per payload length, ascending.
    pub groups: Vec<GroupReport>,
    /// A simple checksum with one constant across every capture of every
    /// length (8-bit only).
    pub batch_checksum: Option<SimpleChecksum>,
}

impl SearchReport {
    /// The report for a payload length.
    pub fn group(&self, length: usize) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.length == length)
    }

    /// Solved groups only.
    pub fn solved(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|g| g.status.is_solved())
    }

    /// Whether every capture shared one payload length.
    ///
    /// Recovered XOR-out constants are then only known for that length.
    pub fn is_single_length(&self) -> bool {
        self.groups.len() == 1
    }

    /// Candidates common to every group that produced any.
    ///
    /// Each length is swept independently; a polynomial that is real must
    /// show up in all of them, so intersecting shrinks ambiguity. Byte order
    /// and reflection are compared too. Returns an empty list when no group
    /// produced candidates.
    pub fn consensus(&self) -> Vec<CandidateParameters> {
        let mut sets = self
            .groups
            .iter()
            .map(|g| g.status.candidates())
            .filter(|c| !c.is_empty());

        let Some(first) = sets.next() else {
            return Vec::new();
        };
        let mut common = first.to_vec();
        for set in sets {
            common.retain(|c| set.binary_search(c).is_ok());
        }
        common
    }
}
