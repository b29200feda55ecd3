//! Command-line interface for building a photomosaic from a target and tile directories

use crate::algorithm::executor::{
    MosaicExecutor, RunConfig, RunOutcome, RunStatus, default_worker_count,
};
use crate::algorithm::usage::{RepeatMode, RepeatPolicy};
use crate::io::configuration::{
    DEFAULT_DIFF_VARIATION, DEFAULT_MATCH_RESOLUTION, DEFAULT_MAX_OCCURRENCES_PER_TILE,
    DEFAULT_OUTPUT_FILE, DEFAULT_RANDOM_RANGE, DEFAULT_TILE_SIZE, DEFAULT_TILES_PER_ROW,
};
use crate::io::error::Result;
use crate::io::interrupt::{CancelToken, install_ctrl_c_handler};
use crate::io::manifest::write_manifest;
use crate::io::progress::{PhaseProgress, ProgressManager, ProgressSink, SilentProgress};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "greedymosaic")]
#[command(
    author,
    version,
    about = "Build a photomosaic of a target image from a directory of tiles"
)]
/// Command-line arguments for the mosaic builder
pub struct Cli {
    /// Image the mosaic should resemble
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Directories searched recursively for tile images
    #[arg(value_name = "TILES", required = true)]
    pub tiles: Vec<PathBuf>,

    /// Output image path, the format follows the extension
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Also write the position-ordered usage manifest as JSON
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Number of tile columns
    #[arg(short = 'n', long, default_value_t = DEFAULT_TILES_PER_ROW)]
    pub tiles_per_row: u32,

    /// Number of tile rows (defaults to the column count)
    #[arg(long)]
    pub tiles_per_column: Option<u32>,

    /// Edge of each tile in the output, in pixels
    #[arg(short, long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    /// Pixel block size averaged into one matching sample
    #[arg(long, default_value_t = DEFAULT_MATCH_RESOLUTION)]
    pub match_resolution: u32,

    /// Jitter of the fill order, 0 fills in random order
    #[arg(short, long, default_value_t = DEFAULT_RANDOM_RANGE)]
    pub random_range: u32,

    /// Grid cell the fill order grows from (defaults to the centre)
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    pub origin: Option<Vec<u32>>,

    /// How tiles may be reused
    #[arg(long, value_enum, default_value_t = RepeatMode::AllIncluded)]
    pub repeat: RepeatMode,

    /// Maximum number of cells one tile may fill
    #[arg(long, default_value_t = DEFAULT_MAX_OCCURRENCES_PER_TILE)]
    pub max_occurrences: usize,

    /// Width of the random distance multiplier, 0 disables it
    #[arg(long, default_value_t = DEFAULT_DIFF_VARIATION)]
    pub diff_variation: f64,

    /// Number of fitting workers (defaults to one less than the core count)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Random seed for reproducible mosaics
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Run parameters described by the arguments
    pub fn run_config(&self) -> RunConfig {
        let fill_origin = match self.origin.as_deref() {
            Some(&[x, y]) => Some([x, y]),
            _ => None,
        };

        RunConfig {
            tile_size: self.tile_size,
            match_resolution: self.match_resolution,
            tiles_per_row: self.tiles_per_row,
            tiles_per_column: self.tiles_per_column,
            random_range: self.random_range,
            fill_origin,
            repeat: RepeatPolicy::new(self.repeat, self.max_occurrences),
            diff_variation: self.diff_variation,
            worker_count: self.workers.unwrap_or_else(default_worker_count),
            output_path: self.output.clone(),
            seed: self.seed,
        }
    }
}

/// Runs one mosaic build from parsed arguments
pub struct MosaicCommand {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl MosaicCommand {
    /// Create a command for the given arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Load tiles, build and save the mosaic, then write the manifest if requested
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, loading, fitting or saving fails
    pub fn process(&mut self) -> Result<RunOutcome> {
        let start_time = Instant::now();
        let cancel = CancelToken::new();
        if let Err(err) = install_ctrl_c_handler(&cancel) {
            warn!("Ctrl-C handler unavailable: {err}");
        }

        let config = self.cli.run_config();
        let loading = self.start_phase("Loading tiles");
        let executor = MosaicExecutor::from_paths(
            config,
            &self.cli.target,
            &self.cli.tiles,
            sink(loading.as_ref()),
            &cancel,
        );
        let executor = match executor {
            Ok(executor) => executor,
            Err(err) => {
                self.finish_progress();
                return Err(err);
            }
        };
        if let Some(phase) = &loading {
            phase.finish();
        }

        let building = self.start_phase("Building mosaic");
        let outcome = executor.run(&cancel, sink(building.as_ref()));
        if let (Ok(_), Some(phase)) = (&outcome, &building) {
            phase.finish();
        }
        self.finish_progress();
        let outcome = outcome?;

        if let Some(path) = &self.cli.manifest {
            write_manifest(&outcome.summary, path)?;
            info!("Wrote manifest to {}", path.display());
        }

        match outcome.status {
            RunStatus::Completed => info!(
                elapsed = ?start_time.elapsed(),
                "Mosaic complete"
            ),
            RunStatus::Unfilled { unfilled, total } => warn!(
                unfilled,
                total,
                elapsed = ?start_time.elapsed(),
                "Mosaic built with empty cells"
            ),
            RunStatus::Interrupted { submitted, total } => warn!(
                submitted,
                total,
                elapsed = ?start_time.elapsed(),
                "Mosaic incomplete"
            ),
        }

        Ok(outcome)
    }

    fn start_phase(&mut self, label: &str) -> Option<PhaseProgress> {
        self.progress_manager.as_mut().map(|pm| pm.start_phase(label))
    }

    fn finish_progress(&self) {
        if let Some(pm) = &self.progress_manager {
            pm.finish();
        }
    }
}

fn sink(phase: Option<&PhaseProgress>) -> &dyn ProgressSink {
    match phase {
        Some(phase) => phase,
        None => &SilentProgress,
    }
}
