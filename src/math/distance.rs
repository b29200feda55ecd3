//! Squared Euclidean colour distance between fingerprints
//!
//! The bounded variant stops accumulating as soon as the running sum exceeds
//! the current best score. A candidate that bails out can never win, so the
//! bounded and full distances always agree on which candidate is best.

use crate::analysis::fingerprint::Rgb;

/// Squared Euclidean distance between two RGB samples
pub fn squared_term(a: &Rgb, b: &Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = u32::from(x.abs_diff(y));
            d * d
        })
        .sum()
}

/// Distance accumulation that gives up once `bail_out` is exceeded
///
/// Every per-sample term is multiplied by `scale`. The returned value is the
/// partial sum at the point of abandonment, which is always greater than
/// `bail_out` in that case.
pub fn bounded_distance(a: &[Rgb], b: &[Rgb], scale: f64, bail_out: f64) -> f64 {
    let mut diff = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff += scale * f64::from(squared_term(x, y));
        if diff > bail_out {
            return diff;
        }
    }
    diff
}

/// Exact distance over every sample, without early termination
pub fn full_distance(a: &[Rgb], b: &[Rgb]) -> u64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| u64::from(squared_term(x, y)))
        .sum()
}
