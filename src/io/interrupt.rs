//! Cooperative cancellation for a running mosaic build

use crate::io::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Shared flag the submitter polls between cells
///
/// Cancelling stops further submission only; tiles already being fitted run
/// to completion and the partial mosaic is still finalized.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Cancel the token when the process receives Ctrl-C
///
/// The signal is awaited on a dedicated thread driving a single-threaded
/// runtime, so the pipeline itself stays free of async code.
///
/// # Errors
///
/// Returns an error if the runtime or its thread cannot be created
pub fn install_ctrl_c_handler(token: &CancelToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let token = token.clone();

    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping...");
                    token.cancel();
                }
            });
        })?;

    Ok(())
}
