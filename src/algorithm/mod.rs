/// Run configuration and orchestration of a full mosaic build
pub mod executor;
/// Best-match search over the candidate catalog
pub mod fitter;
/// Submission order of target cells
pub mod ordering;
/// Producer/consumer fan-out between submitter, fitters and compositor
pub mod pipeline;
/// Repetition policy and shared usage counting
pub mod usage;
