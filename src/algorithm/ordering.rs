//! Submission order of target cells
//!
//! Repetition policies progressively restrict reuse, so cells submitted first
//! get first pick of the catalog. Jittered distance ordering fills outward
//! from an origin with a ragged front; a jitter range of zero falls back to a
//! uniform shuffle.

use crate::spatial::Cell;
use rand::Rng;
use rand::seq::SliceRandom;

/// Strategy deciding the order cells enter the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellOrdering {
    /// Ascending distance from `origin`, both points jittered by up to `range`
    JitteredDistance {
        /// Upper bound of the uniform integer jitter per coordinate
        range: u32,
        /// Reference point in grid coordinates
        origin: [f64; 2],
    },
    /// Uniform random permutation
    Shuffle,
}

impl CellOrdering {
    /// Pick the strategy for a jitter range
    pub const fn for_range(range: u32, origin: [f64; 2]) -> Self {
        if range > 0 {
            Self::JitteredDistance { range, origin }
        } else {
            Self::Shuffle
        }
    }

    /// Reorder cells according to this strategy
    pub fn order<R: Rng + ?Sized>(&self, mut cells: Vec<Cell>, rng: &mut R) -> Vec<Cell> {
        match *self {
            Self::JitteredDistance { range, origin } => {
                let mut keyed: Vec<(f64, Cell)> = cells
                    .into_iter()
                    .map(|cell| {
                        let point = [f64::from(cell.grid_x), f64::from(cell.grid_y)];
                        (jittered_distance(origin, point, range, rng), cell)
                    })
                    .collect();
                keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
                keyed.into_iter().map(|(_, cell)| cell).collect()
            }
            Self::Shuffle => {
                cells.shuffle(rng);
                cells
            }
        }
    }
}

/// Euclidean distance after adding independent jitter in `0..=range` to every coordinate
pub fn jittered_distance<R: Rng + ?Sized>(
    origin: [f64; 2],
    point: [f64; 2],
    range: u32,
    rng: &mut R,
) -> f64 {
    let mut jitter = || f64::from(rng.random_range(0..=range));
    let (x1, y1) = (origin[0] + jitter(), origin[1] + jitter());
    let (x2, y2) = (point[0] + jitter(), point[1] + jitter());
    (x2 - x1).hypot(y2 - y1)
}
