//! Progress reporting for catalog loading and mosaic building

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

/// Resolution of the fraction shown on a phase bar
const BAR_STEPS: u64 = 1_000;

/// Receives fraction-complete updates
///
/// Implementations must return promptly; reporting is best-effort and sits on
/// the submission path.
pub trait ProgressSink: Send + Sync {
    /// Report completion as a fraction in `[0, 1]`
    fn report(&self, fraction: f64);
}

/// Sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&self, _fraction: f64) {}
}

/// Counts processed items and forwards the completed fraction to a sink
pub struct ProgressCounter<'a> {
    total: usize,
    completed: usize,
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressCounter<'a> {
    /// Create a counter over `total` items
    pub fn new(total: usize, sink: &'a dyn ProgressSink) -> Self {
        Self {
            total,
            completed: 0,
            sink,
        }
    }

    /// Record one more processed item
    pub fn advance(&mut self) {
        self.completed += 1;
        self.sink.report(self.fraction());
    }

    /// Items processed so far
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Completed fraction, `1.0` for an empty workload
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }
}

static PHASE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix:>14}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Terminal progress bar for one phase of a run
#[derive(Clone)]
pub struct PhaseProgress {
    bar: ProgressBar,
}

impl PhaseProgress {
    /// Mark the phase as done
    pub fn finish(&self) {
        self.bar.set_position(BAR_STEPS);
        self.bar.set_message("100.0%");
        self.bar.finish();
    }
}

impl ProgressSink for PhaseProgress {
    fn report(&self, fraction: f64) {
        let clamped = fraction.clamp(0.0, 1.0);
        self.bar.set_position((clamped * BAR_STEPS as f64) as u64);
        self.bar.set_message(format!("{:04.1}%", clamped * 100.0));
    }
}

/// Coordinates the progress bars of a run
pub struct ProgressManager {
    multi_progress: MultiProgress,
    phases: Vec<PhaseProgress>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            phases: Vec::new(),
        }
    }

    /// Add a bar for a new phase
    pub fn start_phase(&mut self, label: &str) -> PhaseProgress {
        let bar = self.multi_progress.add(ProgressBar::new(BAR_STEPS));
        bar.set_style(PHASE_STYLE.clone());
        bar.set_prefix(label.to_string());
        let phase = PhaseProgress { bar };
        self.phases.push(phase.clone());
        phase
    }

    /// Number of phases started so far
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        for phase in &self.phases {
            if !phase.bar.is_finished() {
                phase.bar.abandon();
            }
        }
        let _ = self.multi_progress.clear();
    }
}
