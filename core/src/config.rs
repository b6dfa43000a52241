//! Search configuration.
//!
//! Everything the sweep needs beyond the captures themselves. Defaults are
//! fixed; [`SearchConfig::from_env`] overrides them from environment
//! variables, ignoring values that fail to parse.

use std::time::Duration;

/// Default cap on the number of candidates an ambiguous group reports.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 4096;

/// Default number of polynomials per sweep task.
pub const DEFAULT_CHUNK_SIZE: u64 = 1 << 14;

/// How a group's candidates are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchMode {
    /// Sweep every polynomial of the width.
    #[default]
    Exhaustive,
    /// Test the known-algorithm catalog first; sweep only if nothing matches.
    CatalogFirst,
    /// Test the known-algorithm catalog and never sweep.
    CatalogOnly,
}

impl SearchMode {
    /// Parse `exhaustive`, `catalog-first` or `catalog-only`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "exhaustive" => Some(SearchMode::Exhaustive),
            "catalog-first" => Some(SearchMode::CatalogFirst),
            "catalog-only" => Some(SearchMode::CatalogOnly),
            _ => None,
        }
    }

    /// Whether the catalog is consulted at all.
    pub fn uses_catalog(self) -> bool {
        self != SearchMode::Exhaustive
    }
}

/// Search tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Where candidates come from (default: exhaustive sweep).
    pub mode: SearchMode,

    /// Run sweep tasks on the rayon pool (needs the `parallel` feature).
    pub parallel: bool,

    /// Give up on groups still sweeping after this long (default: none).
    pub deadline: Option<Duration>,

    /// Maximum candidates kept for an ambiguous group (default: 4096, at
    /// least 1).
    pub candidate_limit: usize,

    /// Polynomials per sweep task (default: 16384).
    pub chunk_size: u64,
}

impl SearchConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `BEAGLE_MODE` | `mode` (`exhaustive`, `catalog-first`, `catalog-only`) |
    /// | `BEAGLE_PARALLEL` | `parallel` (`true`/`1`) |
    /// | `BEAGLE_DEADLINE_MS` | `deadline` |
    /// | `BEAGLE_CANDIDATE_LIMIT` | `candidate_limit` |
    /// | `BEAGLE_CHUNK_SIZE` | `chunk_size` |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: std::env::var("BEAGLE_MODE")
                .ok()
                .and_then(|s| SearchMode::from_name(&s))
                .unwrap_or(defaults.mode),
            parallel: std::env::var("BEAGLE_PARALLEL")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.parallel),
            deadline: std::env::var("BEAGLE_DEADLINE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .or(defaults.deadline),
            candidate_limit: std::env::var("BEAGLE_CANDIDATE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.candidate_limit),
            chunk_size: std::env::var("BEAGLE_CHUNK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.chunk_size),
        }
    }

    /// Choose where candidates come from.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable the parallel sweep.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set a deadline for the whole search.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cap the candidates kept for ambiguous groups (clamped to at least 1).
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit.max(1);
        self
    }

    /// Polynomials per sweep task (clamped to at least 1).
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            parallel: cfg!(feature = "parallel"),
            deadline: None,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
