//! Producer/consumer fan-out between submitter, fitters and compositor
//!
//! The submitter pushes cells into a `work` channel bounded at the worker
//! count, N fitting workers pull from it and push matches into an unbounded
//! `results` channel, and a single compositor paints them. Shutdown is
//! explicit: the submitter always sends exactly one [`WorkItem::Shutdown`] per
//! worker, even when it stops early, and every worker answers with exactly one
//! [`FitOutcome::WorkerDone`] before exiting.

use crate::{
    algorithm::fitter::TileFitter,
    analysis::catalog::Catalog,
    analysis::fingerprint::Fingerprint,
    io::error::{Result, invalid_parameter, protocol_violation},
    io::interrupt::CancelToken,
    io::progress::{ProgressCounter, ProgressSink},
    spatial::{Cell, TileBox, mosaic::MosaicImage},
};
use bitvec::prelude::bitvec;
use crossbeam::channel::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, error};

/// Message on the `work` channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A cell to fit
    Fit {
        /// Matching fingerprint of the cell
        small: Fingerprint,
        /// Destination rectangle in the mosaic raster
        large_box: TileBox,
    },
    /// No more work will follow for the receiving worker
    Shutdown,
}

/// Message on the `results` channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// A cell was matched to a catalog entry
    Matched {
        /// Destination rectangle in the mosaic raster
        large_box: TileBox,
        /// Chosen candidate
        catalog_index: usize,
    },
    /// The worker received its shutdown item and exits
    WorkerDone {
        /// Index of the acknowledging worker
        worker: usize,
    },
}

/// Result of one pass through the pipeline
pub struct PipelineReport {
    /// Raster and manifest as composited
    pub mosaic: MosaicImage,
    /// Cells handed to the workers
    pub submitted: usize,
    /// Cells offered for submission
    pub total: usize,
    /// Whether submission stopped early on cancellation
    pub interrupted: bool,
    /// Cells each worker fitted, by worker index
    pub fitted_per_worker: Vec<usize>,
}

struct Submission {
    submitted: usize,
    interrupted: bool,
}

// Sends the shutdown items exactly once, including on early return or unwind
struct ShutdownGuard<'a> {
    work: &'a Sender<WorkItem>,
    workers: usize,
    sent: bool,
}

impl<'a> ShutdownGuard<'a> {
    const fn new(work: &'a Sender<WorkItem>, workers: usize) -> Self {
        Self {
            work,
            workers,
            sent: false,
        }
    }

    fn signal(&mut self) -> Result<()> {
        if self.sent {
            return Ok(());
        }
        self.sent = true;
        for _ in 0..self.workers {
            self.work.send(WorkItem::Shutdown).map_err(|_| {
                protocol_violation(&"work channel closed before every worker got its shutdown")
            })?;
        }
        Ok(())
    }
}

impl Drop for ShutdownGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.signal() {
            error!("{err}");
        }
    }
}

/// Run every cell through the fitters and composite the matches
///
/// One worker thread is started per fitter. The calling thread acts as the
/// submitter and checks `cancel` before each cell; once cancelled no further
/// cells are submitted, but everything already queued is still fitted and
/// painted.
///
/// # Errors
///
/// Returns an error if no fitter is supplied, if painting a tile fails, or if
/// the shutdown protocol is violated
pub fn run_pipeline(
    fitters: Vec<TileFitter>,
    catalog: &Catalog,
    cells: Vec<Cell>,
    mosaic: MosaicImage,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<PipelineReport> {
    let workers = fitters.len();
    if workers == 0 {
        return Err(invalid_parameter(
            "worker_count",
            &workers,
            &"at least one fitting worker is required",
        ));
    }
    let total = cells.len();

    let (work_tx, work_rx) = channel::bounded::<WorkItem>(workers);
    let (result_tx, result_rx) = channel::unbounded::<FitOutcome>();

    thread::scope(|scope| {
        let compositor = scope.spawn(move || composite(&result_rx, catalog, mosaic, workers));

        let handles: Vec<_> = fitters
            .into_iter()
            .enumerate()
            .map(|(worker, fitter)| {
                let work = work_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || fit_tiles(worker, fitter, &work, &results))
            })
            .collect();
        drop(work_rx);
        drop(result_tx);

        let submission = submit(cells, &work_tx, workers, cancel, progress);
        drop(work_tx);

        let mut failure = None;
        let mut fitted_per_worker = Vec::with_capacity(workers);
        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(fitted)) => fitted_per_worker.push(fitted),
                Ok(Err(err)) => {
                    fitted_per_worker.push(0);
                    failure.get_or_insert(err);
                }
                Err(_) => {
                    fitted_per_worker.push(0);
                    failure.get_or_insert(protocol_violation(&format!(
                        "worker {worker} panicked"
                    )));
                }
            }
        }

        let mosaic = compositor
            .join()
            .map_err(|_| protocol_violation(&"compositor panicked"))??;
        let submission = submission?;
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(PipelineReport {
            mosaic,
            submitted: submission.submitted,
            total,
            interrupted: submission.interrupted,
            fitted_per_worker,
        })
    })
}

fn submit(
    cells: Vec<Cell>,
    work: &Sender<WorkItem>,
    workers: usize,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<Submission> {
    let mut guard = ShutdownGuard::new(work, workers);
    let mut counter = ProgressCounter::new(cells.len(), progress);
    let mut interrupted = false;

    for cell in cells {
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }
        work.send(WorkItem::Fit {
            small: cell.small,
            large_box: cell.large_box,
        })
        .map_err(|_| protocol_violation(&"every worker exited before submission finished"))?;
        counter.advance();
    }

    guard.signal()?;
    Ok(Submission {
        submitted: counter.completed(),
        interrupted,
    })
}

fn fit_tiles(
    worker: usize,
    mut fitter: TileFitter,
    work: &Receiver<WorkItem>,
    results: &Sender<FitOutcome>,
) -> Result<usize> {
    let mut fitted = 0;
    loop {
        match work.recv() {
            Ok(WorkItem::Fit { small, large_box }) => match fitter.select(&small) {
                Ok(catalog_index) => {
                    results
                        .send(FitOutcome::Matched {
                            large_box,
                            catalog_index,
                        })
                        .map_err(|_| {
                            protocol_violation(&format!(
                                "compositor exited before worker {worker} shut down"
                            ))
                        })?;
                    fitted += 1;
                }
                Err(err) => error!(worker, ?large_box, "Cell left unfilled: {err}"),
            },
            Ok(WorkItem::Shutdown) => break,
            Err(_) => {
                return Err(protocol_violation(&format!(
                    "work channel closed before worker {worker} received its shutdown"
                )));
            }
        }
    }

    results
        .send(FitOutcome::WorkerDone { worker })
        .map_err(|_| {
            protocol_violation(&format!(
                "compositor exited before worker {worker} acknowledged shutdown"
            ))
        })?;
    debug!(worker, fitted, "Worker finished");
    Ok(fitted)
}

fn composite(
    results: &Receiver<FitOutcome>,
    catalog: &Catalog,
    mut mosaic: MosaicImage,
    workers: usize,
) -> Result<MosaicImage> {
    let mut acknowledged = bitvec![0; workers];
    let mut live_workers = workers;

    while live_workers > 0 {
        match results.recv() {
            Ok(FitOutcome::Matched {
                large_box,
                catalog_index,
            }) => {
                let candidate = catalog.get(catalog_index).ok_or_else(|| {
                    protocol_violation(&format!("unknown catalog index {catalog_index}"))
                })?;
                mosaic.place(candidate, large_box)?;
            }
            Ok(FitOutcome::WorkerDone { worker }) => {
                if acknowledged.get(worker).map(|bit| *bit) != Some(false) {
                    return Err(protocol_violation(&format!(
                        "unexpected shutdown acknowledgment from worker {worker}"
                    )));
                }
                acknowledged.set(worker, true);
                live_workers -= 1;
            }
            Err(_) => {
                return Err(protocol_violation(&format!(
                    "result channel closed with {live_workers} workers unacknowledged"
                )));
            }
        }
    }

    Ok(mosaic)
}
