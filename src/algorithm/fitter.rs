use crate::{
    algorithm::usage::{RepeatPolicy, UsageCounter},
    analysis::catalog::Catalog,
    analysis::fingerprint::Fingerprint,
    io::error::{MosaicError, Result},
    math::distance::bounded_distance,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tracing::trace;

/// Greedy best-match search over the candidate catalog
///
/// Each worker owns one fitter. The catalog is shared read-only and the
/// usage counter is shared with every other fitter of the run.
pub struct TileFitter {
    catalog: Arc<Catalog>,
    usage: Arc<UsageCounter>,
    policy: RepeatPolicy,
    variation: f64,
    rng: StdRng,
}

impl TileFitter {
    /// Create a fitter
    ///
    /// `variation` is the width of the random distance multiplier range
    /// `[1 - v/2, 1 + v/2]`; zero disables it.
    pub fn new(
        catalog: Arc<Catalog>,
        usage: Arc<UsageCounter>,
        policy: RepeatPolicy,
        variation: f64,
        seed: u64,
    ) -> Self {
        Self {
            catalog,
            usage,
            policy,
            variation,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Whether the repetition policy currently excludes a candidate
    pub fn should_skip(&self, index: usize) -> bool {
        self.usage.should_skip(index, &self.policy)
    }

    /// Choose the closest eligible candidate for a cell and record its use
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::NoEligibleCandidate`] if the catalog is empty or
    /// the policy excludes every candidate
    pub fn select(&mut self, cell: &Fingerprint) -> Result<usize> {
        loop {
            let best = self
                .best_match(cell)
                .ok_or_else(|| MosaicError::NoEligibleCandidate {
                    catalog_size: self.catalog.len(),
                })?;

            if self.usage.try_claim(best, &self.policy) {
                return Ok(best);
            }
            // Another worker consumed the last permitted use in the meantime
            trace!(index = best, "Usage claim lost, rescanning");
        }
    }

    /// Closest eligible candidate without recording it
    ///
    /// Candidates are scanned in index order and the first one with the
    /// strictly smallest distance wins.
    pub fn best_match(&mut self, cell: &Fingerprint) -> Option<usize> {
        let mut best_diff = f64::INFINITY;
        let mut best_index = None;

        let catalog = Arc::clone(&self.catalog);
        for candidate in catalog.iter() {
            let index = candidate.catalog_index();
            if self.should_skip(index) {
                continue;
            }
            let scale = self.variation_scale();
            let diff = bounded_distance(cell.pixels(), candidate.small().pixels(), scale, best_diff);
            if diff < best_diff {
                best_diff = diff;
                best_index = Some(index);
            }
        }

        best_index
    }

    fn variation_scale(&mut self) -> f64 {
        if self.variation > 0.0 {
            1.0 + self.rng.random::<f64>().mul_add(self.variation, -self.variation / 2.0)
        } else {
            1.0
        }
    }
}
