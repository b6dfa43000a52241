//! Polynomial / reflection sweep.
//!
//! For each viable output byte order and each [`Reflection`], every
//! polynomial of the width with its low bit set is tried against the seed
//! difference pairs. A candidate is dropped at the first seed pair it fails,
//! so almost all of the 2^(width-1) polynomials cost a single short CRC.
//! Survivors are checked against every cross pair before they are reported.
//!
//! The polynomial range is cut into chunks and each (order, reflection,
//! chunk) task runs with its own [`Register`]; with the `parallel` feature the
//! tasks run on the rayon pool and their results are concatenated, then
//! sorted so the outcome does not depend on scheduling.
//!
//! A task stops on its own once it holds more candidates than the limit.
//! Tasks never look at each other's progress, so a truncated list is always
//! the lowest-sorted prefix of the complete set.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::capture::{LengthGroup, OutputOrder};
use crate::config::SearchConfig;
use crate::crc::{compute_raw, mask, CrcModel, Reflection, Register};
use crate::pairs::{DifferencePair, PairSet};

/// How many polynomials a task tries between budget checks.
const CHECK_INTERVAL: u64 = 256;

/// One (polynomial, reflection, byte order) combination consistent with a
/// group's differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateParameters {
    /// Register width in bits.
    pub width: u32,
    /// Generator polynomial, normal form, low bit set.
    pub polynomial: u64,
    /// Reflect-input / reflect-output convention.
    pub reflection: Reflection,
    /// Byte order the output bytes were read in.
    pub output_order: OutputOrder,
}

impl CandidateParameters {
    /// Whether input bytes are consumed LSB-first.
    pub fn reflect_in(&self) -> bool {
        self.reflection.reflect_in()
    }

    /// Whether the final register is bit-reversed.
    pub fn reflect_out(&self) -> bool {
        self.reflection.reflect_out()
    }

    /// CRC of `data` with zero init and zero XOR-out.
    pub fn raw_crc(&self, data: &[u8]) -> u64 {
        compute_raw(self.width, self.polynomial, self.reflection, data)
    }

    /// A complete model with zero init and the given XOR-out.
    ///
    /// For a solved group this reproduces every observed output of that
    /// payload length.
    pub fn model(&self, xor_out: u64) -> CrcModel {
        CrcModel {
            width: self.width,
            polynomial: self.polynomial,
            init: 0,
            reflection: self.reflection,
            xor_out,
        }
    }

    /// Whether this candidate explains every difference pair in `pairs`.
    pub fn satisfies(&self, pairs: &PairSet) -> bool {
        pairs
            .all()
            .all(|p| self.raw_crc(p.delta()) == p.delta_output(self.output_order))
    }
}

impl fmt::Display for CandidateParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.width.div_ceil(4) as usize;
        write!(
            f,
            "width={} poly={:#0w$x} refin={} refout={} order={:?}",
            self.width,
            self.polynomial,
            self.reflect_in(),
            self.reflect_out(),
            self.output_order,
            w = digits + 2,
        )
    }
}

/// Cooperative cancellation flag shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask running searches to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancellation token plus optional wall-clock deadline.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A budget that runs out when `cancel` fires or `deadline` passes.
    pub fn new(cancel: Option<CancelToken>, deadline: Option<Instant>) -> Self {
        Self { cancel, deadline }
    }

    /// Whether the search should stop.
    pub fn expired(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// The sweep stopped before finishing; its partial results were discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Candidates found for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    /// Sorted, unique candidates.
    pub candidates: Vec<CandidateParameters>,
    /// More candidates existed than the configured limit allowed.
    pub truncated: bool,
}

impl CandidateSet {
    /// Sort, dedup and cut `candidates` down to `limit`.
    pub fn limited(mut candidates: Vec<CandidateParameters>, limit: usize) -> Self {
        candidates.sort_unstable();
        candidates.dedup();
        let truncated = candidates.len() > limit;
        candidates.truncate(limit);
        Self {
            candidates,
            truncated,
        }
    }
}

/// Byte orders worth sweeping for a group.
///
/// A declared order is taken as is. Otherwise single-byte outputs only have
/// one reading, and an order is dropped if any output decodes to a value
/// wider than the CRC.
pub fn viable_orders(
    group: &LengthGroup,
    width: u32,
    output_len: usize,
    declared: Option<OutputOrder>,
) -> Vec<OutputOrder> {
    let orders: &[OutputOrder] = match (declared.as_ref(), output_len) {
        (Some(order), _) => std::slice::from_ref(order),
        (None, 1) => &[OutputOrder::BigEndian],
        (None, _) => &OutputOrder::ALL,
    };
    let limit = mask(width);
    orders
        .iter()
        .copied()
        .filter(|&order| {
            group
                .captures()
                .iter()
                .all(|c| c.output_value(order) <= limit)
        })
        .collect()
}

/// A difference reduced to what the register sees: the delta bytes worth
/// stepping and the raw register value they must produce.
struct Target<'a> {
    delta: &'a [u8],
    register: u64,
}

/// One (order, reflection) slice of the search space.
struct Combo<'a> {
    order: OutputOrder,
    reflection: Reflection,
    seed: Vec<Target<'a>>,
    cross: Vec<Target<'a>>,
}

impl<'a> Combo<'a> {
    fn new(width: u32, order: OutputOrder, reflection: Reflection, pairs: &'a PairSet) -> Self {
        // Undo the output reflection on the target once instead of applying
        // it to the register for every polynomial.
        let target = |p: &'a DifferencePair| Target {
            delta: p.effective_delta(),
            register: reflection.finish(p.delta_output(order), width),
        };
        Self {
            order,
            reflection,
            seed: pairs.seed().iter().map(target).collect(),
            cross: pairs.cross().iter().map(target).collect(),
        }
    }
}

fn matches(register: &mut Register, targets: &[Target<'_>]) -> bool {
    targets.iter().all(|t| {
        register.load(0);
        register.update(t.delta);
        register.value() == t.register
    })
}

struct Sweep<'a> {
    width: u32,
    chunk_size: u64,
    polynomial_count: u64,
    limit: usize,
    budget: &'a Budget,
    combos: Vec<Combo<'a>>,
}

impl Sweep<'_> {
    fn chunk_count(&self) -> u64 {
        self.polynomial_count.div_ceil(self.chunk_size)
    }

    fn run_chunk(
        &self,
        combo: &Combo<'_>,
        chunk: u64,
    ) -> Result<Vec<CandidateParameters>, Interrupted> {
        let start = chunk * self.chunk_size;
        let end = (start + self.chunk_size).min(self.polynomial_count);
        let mut register = Register::new(self.width, 1, combo.reflection);
        let mut found = Vec::new();

        for index in start..end {
            if (index - start) % CHECK_INTERVAL == 0 && self.budget.expired() {
                return Err(Interrupted);
            }

            let polynomial = (index << 1) | 1;
            register.set_polynomial(polynomial);
            if matches(&mut register, &combo.seed) && matches(&mut register, &combo.cross) {
                found.push(CandidateParameters {
                    width: self.width,
                    polynomial,
                    reflection: combo.reflection,
                    output_order: combo.order,
                });
                // Anything past the limit in this task sorts after what it
                // already holds.
                if found.len() > self.limit {
                    break;
                }
            }
        }

        if !found.is_empty() {
            trace!(
                order = ?combo.order,
                reflection = ?combo.reflection,
                chunk,
                survivors = found.len(),
                "Chunk produced candidates"
            );
        }
        Ok(found)
    }

    fn run_sequential(&self) -> Result<Vec<Vec<CandidateParameters>>, Interrupted> {
        self.combos
            .iter()
            .flat_map(|combo| (0..self.chunk_count()).map(move |chunk| (combo, chunk)))
            .map(|(combo, chunk)| self.run_chunk(combo, chunk))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn run_parallel(&self) -> Result<Vec<Vec<CandidateParameters>>, Interrupted> {
        self.combos
            .par_iter()
            .flat_map(|combo| {
                (0..self.chunk_count())
                    .into_par_iter()
                    .map(move |chunk| (combo, chunk))
            })
            .map(|(combo, chunk)| self.run_chunk(combo, chunk))
            .collect()
    }
}

/// Find every candidate consistent with all of `pairs`.
///
/// `pairs` must hold at least one pair. Returns [`Interrupted`] if the
/// budget ran out mid-sweep.
pub fn find_candidates(
    pairs: &PairSet,
    orders: &[OutputOrder],
    width: u32,
    config: &SearchConfig,
    budget: &Budget,
) -> Result<CandidateSet, Interrupted> {
    let combos = orders
        .iter()
        .flat_map(|&order| {
            Reflection::ALL
                .into_iter()
                .map(move |reflection| Combo::new(width, order, reflection, pairs))
        })
        .collect();

    let sweep = Sweep {
        width,
        chunk_size: config.chunk_size.max(1),
        polynomial_count: 1u64 << (width - 1),
        limit: config.candidate_limit,
        budget,
        combos,
    };

    #[cfg(feature = "parallel")]
    let chunks = if config.parallel {
        sweep.run_parallel()?
    } else {
        sweep.run_sequential()?
    };
    #[cfg(not(feature = "parallel"))]
    let chunks = sweep.run_sequential()?;

    Ok(CandidateSet::limited(
        chunks.into_iter().flatten().collect(),
        config.candidate_limit,
    ))
}
