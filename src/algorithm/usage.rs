//! Repetition policy and the usage counter shared by every fitter of a run
//!
//! The counter is the only mutable state fitters share. Counts only grow,
//! and a placement is recorded with an atomic claim that re-checks the policy
//! against the current count, so occurrence caps hold even when several
//! workers race for the same candidate.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How candidates may be reused across cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum RepeatMode {
    /// A candidate fills at most one cell
    StrictNo,
    /// Behaves like `StrictNo` when selecting
    Minimized,
    /// Every candidate is used once before any is reused
    AllIncluded,
    /// Reuse is allowed up to the occurrence cap
    Ok,
}

impl RepeatMode {
    /// Stable name used in logs and error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::StrictNo => "strict-no",
            Self::Minimized => "minimized",
            Self::AllIncluded => "all-included",
            Self::Ok => "ok",
        }
    }

    /// Whether a used candidate may ever be chosen again
    pub const fn allows_reuse(self) -> bool {
        matches!(self, Self::AllIncluded | Self::Ok)
    }

    /// Whether correctness of this mode requires a single fitting worker
    pub const fn forces_single_worker(self) -> bool {
        matches!(self, Self::StrictNo | Self::AllIncluded)
    }
}

/// Repetition mode plus the per-candidate occurrence cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatPolicy {
    /// Reuse rule
    pub mode: RepeatMode,
    /// Maximum number of cells one candidate may fill
    pub max_occurrences: usize,
}

impl RepeatPolicy {
    /// Create a policy
    pub const fn new(mode: RepeatMode, max_occurrences: usize) -> Self {
        Self {
            mode,
            max_occurrences,
        }
    }

    /// Whether a candidate already used `occurrences` times may be chosen
    pub const fn permits(&self, occurrences: usize, all_included: bool) -> bool {
        if occurrences == 0 {
            return true;
        }
        match self.mode {
            RepeatMode::StrictNo | RepeatMode::Minimized => return false,
            RepeatMode::AllIncluded if !all_included => return false,
            RepeatMode::AllIncluded | RepeatMode::Ok => {}
        }
        occurrences < self.max_occurrences
    }

    /// Most placements a catalog of `catalog_size` can supply under this policy
    pub const fn capacity(&self, catalog_size: usize) -> usize {
        if self.mode.allows_reuse() {
            catalog_size.saturating_mul(self.max_occurrences)
        } else {
            catalog_size
        }
    }
}

/// Per-candidate occurrence counts shared by all fitters
#[derive(Debug)]
pub struct UsageCounter {
    counts: Vec<AtomicUsize>,
    distinct: AtomicUsize,
}

impl UsageCounter {
    /// Create an empty counter for a catalog of the given size
    pub fn new(catalog_size: usize) -> Self {
        Self {
            counts: (0..catalog_size).map(|_| AtomicUsize::new(0)).collect(),
            distinct: AtomicUsize::new(0),
        }
    }

    /// Size of the catalog being tracked
    pub fn catalog_size(&self) -> usize {
        self.counts.len()
    }

    /// Number of cells the candidate has filled so far
    pub fn occurrences(&self, index: usize) -> usize {
        self.counts
            .get(index)
            .map_or(0, |count| count.load(Ordering::Acquire))
    }

    /// Number of candidates used at least once
    pub fn distinct_used(&self) -> usize {
        self.distinct.load(Ordering::Acquire)
    }

    /// Whether every candidate has been used at least once
    pub fn all_included(&self) -> bool {
        !self.counts.is_empty() && self.distinct_used() >= self.counts.len()
    }

    /// Whether the policy currently excludes the candidate
    pub fn should_skip(&self, index: usize, policy: &RepeatPolicy) -> bool {
        !policy.permits(self.occurrences(index), self.all_included())
    }

    /// Record one placement of the candidate if the policy still permits it
    ///
    /// Returns `false` when another fitter got there first and the policy no
    /// longer allows this placement, or when the index is out of range.
    pub fn try_claim(&self, index: usize, policy: &RepeatPolicy) -> bool {
        let Some(slot) = self.counts.get(index) else {
            return false;
        };

        let mut current = slot.load(Ordering::Acquire);
        loop {
            if !policy.permits(current, self.all_included()) {
                return false;
            }
            match slot.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if current == 0 {
                        self.distinct.fetch_add(1, Ordering::AcqRel);
                    }
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Counts of every used candidate, keyed by catalog index
    pub fn snapshot(&self) -> BTreeMap<usize, usize> {
        self.counts
            .iter()
            .enumerate()
            .filter_map(|(index, count)| {
                let occurrences = count.load(Ordering::Acquire);
                (occurrences > 0).then_some((index, occurrences))
            })
            .collect()
    }
}
