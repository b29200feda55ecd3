use crate::{
    algorithm::fitter::TileFitter,
    algorithm::ordering::CellOrdering,
    algorithm::pipeline::run_pipeline,
    algorithm::usage::{RepeatMode, RepeatPolicy, UsageCounter},
    analysis::catalog::{Catalog, enumerate_directories},
    analysis::fingerprint::FingerprintReducer,
    analysis::target::TargetImage,
    io::configuration::{
        DEFAULT_DIFF_VARIATION, DEFAULT_MATCH_RESOLUTION, DEFAULT_MAX_OCCURRENCES_PER_TILE,
        DEFAULT_OUTPUT_FILE, DEFAULT_RANDOM_RANGE, DEFAULT_TILE_SIZE, DEFAULT_TILES_PER_ROW,
    },
    io::error::{MosaicError, Result, invalid_parameter},
    io::interrupt::CancelToken,
    io::progress::ProgressSink,
    spatial::GridLayout,
    spatial::mosaic::{MosaicImage, MosaicSummary},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Parameters of a single mosaic run
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Edge of a composited tile in pixels
    pub tile_size: u32,
    /// Block size in tile pixels collapsed into one matching sample
    pub match_resolution: u32,
    /// Number of tile columns
    pub tiles_per_row: u32,
    /// Number of tile rows, defaults to `tiles_per_row`
    pub tiles_per_column: Option<u32>,
    /// Jitter range of the cell fill order, zero shuffles instead
    pub random_range: u32,
    /// Grid coordinate the fill order grows from, defaults to the grid centre
    pub fill_origin: Option<[u32; 2]>,
    /// Repetition rule and occurrence cap
    pub repeat: RepeatPolicy,
    /// Width of the random distance multiplier range, zero disables it
    pub diff_variation: f64,
    /// Requested number of fitting workers
    pub worker_count: usize,
    /// Where the composited mosaic is written
    pub output_path: PathBuf,
    /// Seed for every random choice, `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            match_resolution: DEFAULT_MATCH_RESOLUTION,
            tiles_per_row: DEFAULT_TILES_PER_ROW,
            tiles_per_column: None,
            random_range: DEFAULT_RANDOM_RANGE,
            fill_origin: None,
            repeat: RepeatPolicy::new(RepeatMode::AllIncluded, DEFAULT_MAX_OCCURRENCES_PER_TILE),
            diff_variation: DEFAULT_DIFF_VARIATION,
            worker_count: default_worker_count(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            seed: None,
        }
    }
}

/// Requested and effective worker counts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerAllocation {
    /// Workers asked for by the configuration
    pub requested: usize,
    /// Workers actually started
    pub effective: usize,
    /// Whether the repeat mode overrode the request
    pub forced: bool,
}

impl RunConfig {
    /// Check every parameter before any work is done
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid parameter
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(invalid_parameter(
                "tile_size",
                &self.tile_size,
                &"must be positive",
            ));
        }
        // Multipliers span 1 - v/2 ..= 1 + v/2 and must stay positive
        if !(0.0..2.0).contains(&self.diff_variation) {
            return Err(invalid_parameter(
                "diff_variation",
                &self.diff_variation,
                &"must be at least 0 and below 2",
            ));
        }
        if self.repeat.max_occurrences == 0 {
            return Err(invalid_parameter(
                "max_occurrences",
                &self.repeat.max_occurrences,
                &"must be at least 1",
            ));
        }
        if self.worker_count == 0 {
            return Err(invalid_parameter(
                "worker_count",
                &self.worker_count,
                &"must be at least 1",
            ));
        }
        let layout = self.layout()?;
        if let Some([x, y]) = self.fill_origin {
            if x >= layout.x_tiles() || y >= layout.y_tiles() {
                return Err(invalid_parameter(
                    "fill_origin",
                    &format!("{x},{y}"),
                    &"must lie inside the tile grid",
                ));
            }
        }
        Ok(())
    }

    /// Fingerprint reducer for these tile settings
    ///
    /// # Errors
    ///
    /// Returns an error if the tile size is zero
    pub fn reducer(&self) -> Result<FingerprintReducer> {
        FingerprintReducer::new(self.tile_size, self.match_resolution)
    }

    /// Grid layout for these tile settings
    ///
    /// # Errors
    ///
    /// Returns an error if the tile counts or sizes are out of range
    pub fn layout(&self) -> Result<GridLayout> {
        let reducer = self.reducer()?;
        GridLayout::new(
            self.tiles_per_row,
            self.tiles_per_column.unwrap_or(self.tiles_per_row),
            reducer.tile_size(),
            reducer.small_edge(),
        )
    }

    /// Worker count after the repeat-mode override
    ///
    /// Modes whose skip decisions depend on strict placement order run with a
    /// single fitting worker.
    pub const fn worker_allocation(&self) -> WorkerAllocation {
        let forced = self.repeat.mode.forces_single_worker() && self.worker_count > 1;
        WorkerAllocation {
            requested: self.worker_count,
            effective: if forced { 1 } else { self.worker_count },
            forced,
        }
    }
}

/// One fewer worker than available cores, at least one
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map_or(1, |cores| cores.get().saturating_sub(1))
        .max(1)
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Every cell was submitted and filled
    Completed,
    /// Every cell was submitted but the repeat policy ran out of candidates
    Unfilled {
        /// Cells left without a tile
        unfilled: usize,
        /// Cells in the grid
        total: usize,
    },
    /// Submission stopped early; the partial mosaic was still saved
    Interrupted {
        /// Cells submitted before cancellation
        submitted: usize,
        /// Cells in the grid
        total: usize,
    },
}

/// Everything a caller learns from a finished run
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Position-ordered manifest and aggregates
    pub summary: MosaicSummary,
    /// Completion state
    pub status: RunStatus,
    /// Worker counts the run used
    pub workers: WorkerAllocation,
    /// Final occurrence count of every used candidate
    pub usage: BTreeMap<usize, usize>,
}

/// Builds one mosaic from a prepared target and catalog
pub struct MosaicExecutor {
    config: RunConfig,
    catalog: Arc<Catalog>,
    target: TargetImage,
    rng: StdRng,
}

impl MosaicExecutor {
    /// Create an executor from already prepared inputs
    ///
    /// # Errors
    ///
    /// A catalog too small for the repeat policy is accepted; the cells it
    /// cannot cover are left unfilled and reported in the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The target was prepared for a different grid
    pub fn new(config: RunConfig, catalog: Catalog, target: TargetImage) -> Result<Self> {
        config.validate()?;
        let layout = config.layout()?;
        if *target.layout() != layout {
            return Err(invalid_parameter(
                "target",
                &format!("{:?}", target.layout()),
                &"target was prepared for a different grid",
            ));
        }

        let capacity = config.repeat.capacity(catalog.len());
        if capacity < layout.cell_count() {
            warn!(
                cells = layout.cell_count(),
                capacity,
                mode = config.repeat.mode.name(),
                "Not enough tiles to fill every cell, {} will stay empty",
                layout.cell_count() - capacity
            );
        }

        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            target,
            rng,
        })
    }

    /// Load the target and every candidate under `tile_dirs`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The target cannot be decoded
    /// - A tiles directory cannot be scanned
    /// - No candidate is usable ([`MosaicError::EmptyCatalog`])
    /// - `cancel` is set while loading ([`MosaicError::Cancelled`])
    pub fn from_paths(
        config: RunConfig,
        target_path: &Path,
        tile_dirs: &[PathBuf],
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Self> {
        config.validate()?;
        let layout = config.layout()?;
        let target = TargetImage::open(target_path, layout)?;

        for dir in tile_dirs {
            info!("Reading tiles from {}...", dir.display());
        }
        let sources = enumerate_directories(tile_dirs)?;
        let catalog = Catalog::build_cancellable(sources, &config.reducer()?, progress, cancel)?;

        Self::new(config, catalog, target)
    }

    /// The indexed candidates
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The run configuration
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Fit every cell, composite the mosaic and save it
    ///
    /// Cancellation stops submission; the partially filled mosaic is still
    /// written and summarized. A run cancelled before any cell was submitted
    /// writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the run was cancelled before submission, the
    /// pipeline shutdown protocol is violated or the mosaic cannot be saved
    pub fn run(mut self, cancel: &CancelToken, progress: &dyn ProgressSink) -> Result<RunOutcome> {
        if cancel.is_cancelled() {
            return Err(MosaicError::Cancelled {
                stage: "startup",
            });
        }

        let workers = self.config.worker_allocation();
        if workers.forced {
            warn!(
                requested = workers.requested,
                mode = self.config.repeat.mode.name(),
                "Repeat mode requires a single fitting worker, running with 1"
            );
        }

        let layout = *self.target.layout();
        let origin = self
            .config
            .fill_origin
            .map_or_else(|| layout.center(), |[x, y]| [f64::from(x), f64::from(y)]);
        let ordering = CellOrdering::for_range(self.config.random_range, origin);
        let cells = ordering.order(self.target.cells(), &mut self.rng);

        let usage = Arc::new(UsageCounter::new(self.catalog.len()));
        let fitters = (0..workers.effective)
            .map(|_| {
                TileFitter::new(
                    Arc::clone(&self.catalog),
                    Arc::clone(&usage),
                    self.config.repeat,
                    self.config.diff_variation,
                    self.rng.random(),
                )
            })
            .collect();

        info!(
            cells = cells.len(),
            candidates = self.catalog.len(),
            workers = workers.effective,
            "Building mosaic, press Ctrl-C to abort..."
        );

        let report = run_pipeline(
            fitters,
            &self.catalog,
            cells,
            MosaicImage::new(layout),
            cancel,
            progress,
        )?;

        if report.interrupted && report.submitted == 0 {
            return Err(MosaicError::Cancelled {
                stage: "submission",
            });
        }

        let unfilled = report.total - report.mosaic.painted_cells();
        let status = if report.interrupted {
            warn!(
                submitted = report.submitted,
                total = report.total,
                "Run interrupted, saving partial mosaic"
            );
            RunStatus::Interrupted {
                submitted: report.submitted,
                total: report.total,
            }
        } else if unfilled > 0 {
            warn!(unfilled, total = report.total, "Some cells were left unfilled");
            RunStatus::Unfilled {
                unfilled,
                total: report.total,
            }
        } else {
            RunStatus::Completed
        };

        let summary = report.mosaic.finalize(&self.config.output_path)?;
        info!("Number of unique tiles: {}", summary.distinct_tiles);
        info!("Number of download bytes required: {}", summary.total_bytes);

        Ok(RunOutcome {
            summary,
            status,
            workers,
            usage: usage.snapshot(),
        })
    }
}
