//! Mathematical utilities for tile matching

/// Squared colour distance with early termination
pub mod distance;
