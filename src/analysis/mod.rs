//! Reduction of target and candidate images into comparable fingerprints

/// Candidate sources and the indexed candidate catalog
pub mod catalog;
/// Fingerprint representation and image reduction
pub mod fingerprint;
/// Target image preparation and cell extraction
pub mod target;
