//! Search entry point.
//!
//! A [`SearchRequest`] carries everything one call needs; [`search`] turns it
//! into a [`SearchReport`] without touching any shared state.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::capture::{Capture, CaptureStore, LengthGroup, OutputOrder};
use crate::catalog;
use crate::checksum;
use crate::config::{SearchConfig, SearchMode};
use crate::error::Result;
use crate::pairs::PairSet;
use crate::report::{Coverage, GroupReport, GroupStatus, SearchReport};
use crate::search::{
    find_candidates, viable_orders, Budget, CancelToken, CandidateSet, Interrupted,
};
use crate::xorout::{self, XorOut};

#[derive(Debug, Clone)]
enum Input {
    Loose(Vec<Capture>),
    Grouped(Vec<Vec<Capture>>),
}

/// Everything needed for one search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    input: Input,
    width: Option<u32>,
    output_order: Option<OutputOrder>,
    config: SearchConfig,
    cancel: Option<CancelToken>,
}

impl SearchRequest {
    /// Loose captures, grouped by payload length automatically.
    pub fn from_captures(captures: Vec<Capture>) -> Self {
        Self::with_input(Input::Loose(captures))
    }

    /// Captures the caller already grouped by payload length.
    pub fn from_groups(groups: Vec<Vec<Capture>>) -> Self {
        Self::with_input(Input::Grouped(groups))
    }

    fn with_input(input: Input) -> Self {
        Self {
            input,
            width: None,
            output_order: None,
            config: SearchConfig::default(),
            cancel: None,
        }
    }

    /// Declare the CRC width instead of inferring it from the output length.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Declare the output byte order instead of trying both.
    pub fn with_output_order(mut self, order: OutputOrder) -> Self {
        self.output_order = Some(order);
        self
    }

    /// Replace the default search configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a token the caller can use to stop the search.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn store(&self) -> Result<CaptureStore> {
        match &self.input {
            Input::Loose(captures) => CaptureStore::from_captures(captures.clone(), self.width),
            Input::Grouped(groups) => CaptureStore::from_groups(groups.clone(), self.width),
        }
    }
}

/// Recover CRC parameters for every payload length in the request.
///
/// Group-level problems are reported per group and never abort the call.
///
/// # Errors
///
/// Batch-level validation errors from [`CaptureStore`]: `NoCaptures`,
/// `WidthMismatch`, `UnsupportedWidth` and `LengthMismatch`.
pub fn search(request: &SearchRequest) -> Result<SearchReport> {
    let store = request.store()?;
    let width = store.width();
    let started = Instant::now();
    let budget = Budget::new(
        request.cancel.clone(),
        request.config.deadline.map(|d| started + d),
    );

    info!(
        width,
        output_len = store.output_len(),
        groups = store.lengths().count(),
        parallel = request.config.parallel,
        "Starting CRC parameter search"
    );
    if store.is_single_length() {
        warn!("All captures share one payload length; XOR-out only holds for that length");
    }

    let groups: Vec<GroupReport> = store
        .groups()
        .map(|group| analyze_group(&store, group, request, &budget))
        .collect();

    let all: Vec<&Capture> = store.captures().collect();
    let batch_checksum = checksum::detect(width, all.iter().copied());
    if let Some(found) = batch_checksum {
        info!(kind = ?found.kind, xor_out = found.xor_out, "Batch matches a simple checksum");
    }

    info!(
        solved = groups.iter().filter(|g| g.status.is_solved()).count(),
        elapsed_ms = started.elapsed().as_millis(),
        "Search finished"
    );

    Ok(SearchReport {
        width,
        output_len: store.output_len(),
        groups,
        batch_checksum,
    })
}

fn analyze_group(
    store: &CaptureStore,
    group: &LengthGroup,
    request: &SearchRequest,
    budget: &Budget,
) -> GroupReport {
    let width = store.width();
    let (status, coverage) = group_status(store, group, request, budget);
    let simple_checksum = checksum::detect(width, group.captures());
    if let Some(found) = simple_checksum {
        debug!(
            length = group.length(),
            kind = ?found.kind,
            xor_out = found.xor_out,
            "Group matches a simple checksum"
        );
    }

    GroupReport {
        length: group.length(),
        captures: group.len(),
        status,
        coverage,
        simple_checksum,
    }
}

fn group_status(
    store: &CaptureStore,
    group: &LengthGroup,
    request: &SearchRequest,
    budget: &Budget,
) -> (GroupStatus, Option<Coverage>) {
    let length = group.length();
    if !group.is_analyzable() {
        debug!(length, captures = group.len(), "Not enough captures to difference");
        return (GroupStatus::InsufficientData, None);
    }

    let pairs = match PairSet::build(group) {
        Ok(pairs) => pairs,
        Err(degenerate) => {
            warn!(
                length,
                first = degenerate.first,
                second = degenerate.second,
                "Identical payloads with different outputs"
            );
            return (GroupStatus::DegenerateInput(degenerate), None);
        }
    };

    let width = store.width();
    let config = &request.config;
    let orders = viable_orders(group, width, store.output_len(), request.output_order);
    if orders.is_empty() {
        debug!(length, "No byte order fits the width");
        return (GroupStatus::NoSolution, Some(Coverage::Exhaustive));
    }

    if config.mode.uses_catalog() {
        if budget.expired() {
            return (GroupStatus::Cancelled, None);
        }
        let known = catalog::candidates(&pairs, &orders, width);
        debug!(length, candidates = known.len(), mode = ?config.mode, "Catalog pass");
        if !known.is_empty() || config.mode == SearchMode::CatalogOnly {
            let set = CandidateSet::limited(known, config.candidate_limit);
            return (classify(set, group), Some(Coverage::Catalog));
        }
    }

    debug!(
        length,
        captures = group.len(),
        pairs = pairs.len(),
        orders = ?orders,
        "Sweeping polynomials"
    );
    let set = match find_candidates(&pairs, &orders, width, config, budget) {
        Ok(set) => set,
        Err(Interrupted) => {
            warn!(length, "Search interrupted");
            return (GroupStatus::Cancelled, None);
        }
    };
    debug!(
        length,
        candidates = set.candidates.len(),
        truncated = set.truncated,
        "Sweep complete"
    );
    (classify(set, group), Some(Coverage::Exhaustive))
}

/// Turn a candidate set into a status.
///
/// A truncated set is ambiguous whatever is left of it.
fn classify(set: CandidateSet, group: &LengthGroup) -> GroupStatus {
    let length = group.length();
    if set.truncated {
        return GroupStatus::AmbiguousSolution {
            candidates: set.candidates,
            truncated: true,
        };
    }

    match set.candidates.as_slice() {
        [] => GroupStatus::NoSolution,
        [candidate] => match xorout::solve(candidate, group) {
            XorOut::Constant(xor_out) => {
                debug!(length, %candidate, xor_out, "Solved");
                GroupStatus::Solved {
                    candidate: *candidate,
                    xor_out,
                }
            }
            XorOut::Inconsistent(residuals) => {
                warn!(
                    length,
                    %candidate,
                    residuals = residuals.len(),
                    "Residuals disagree for the only candidate"
                );
                GroupStatus::InconsistentXorOut {
                    candidate: *candidate,
                    residuals,
                }
            }
        },
        _ => GroupStatus::AmbiguousSolution {
            candidates: set.candidates,
            truncated: false,
        },
    }
}
