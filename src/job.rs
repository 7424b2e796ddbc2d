//! Export jobs: run every store of a batch in parallel, then finalize it.
//!
//! Stores run on the rayon pool and only share the batch by reference.
//! Finalizing needs the batch by value, so it can only start once every
//! worker has returned.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::export::Batch;
use crate::launch::LaunchHandle;
use crate::mailer::Mailer;

/// One image to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportItem {
    pub image_id: u32,
    pub source: PathBuf,
}

impl ExportItem {
    pub fn new(image_id: u32, source: impl Into<PathBuf>) -> Self {
        Self {
            image_id,
            source: source.into(),
        }
    }
}

/// An image that could not be exported.
#[derive(Debug)]
pub struct ExportFailure {
    pub image_id: u32,
    pub source: PathBuf,
    pub error: Error,
}

/// Result of a finished export job.
#[derive(Debug)]
pub struct JobOutcome {
    /// Pending outcome of the mail client launch.
    pub launch: LaunchHandle,
    /// Images skipped because their export failed.
    pub failures: Vec<ExportFailure>,
}

/// Export every item into `batch` in parallel.
///
/// `extension` is the target format; `None` keeps each source's own
/// extension. `progress` receives `(completed, total)` after every item.
/// Failed items are logged and returned; the others are stored.
pub fn export_all(
    batch: &Batch,
    items: &[ExportItem],
    extension: Option<&str>,
    progress: &(dyn Fn(usize, usize) + Sync),
) -> Vec<ExportFailure> {
    let total = items.len();
    let completed = AtomicUsize::new(0);

    let failures: Vec<ExportFailure> = items
        .par_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let result = target_extension(&item.source, extension).and_then(|ext| {
                batch.store_numbered(item.image_id, &item.source, &ext, i + 1, total)
            });

            progress(completed.fetch_add(1, Ordering::Relaxed) + 1, total);

            match result {
                Ok(_) => None,
                Err(error) => {
                    tracing::warn!(
                        image_id = item.image_id,
                        source = %item.source.display(),
                        error = %error,
                        "Failed to export image"
                    );
                    Some(ExportFailure {
                        image_id: item.image_id,
                        source: item.source.clone(),
                        error,
                    })
                }
            }
        })
        .collect();

    tracing::info!(
        exported = total - failures.len(),
        failed = failures.len(),
        "Export finished"
    );
    failures
}

/// Export every item, then finalize the batch with `mailer`.
///
/// Fails with [`Error::EmptyBatch`] when no item could be exported.
pub fn run_export_job(
    batch: Batch,
    items: &[ExportItem],
    extension: Option<&str>,
    mailer: &Mailer,
    progress: &(dyn Fn(usize, usize) + Sync),
) -> Result<JobOutcome> {
    let failures = export_all(&batch, items, extension, progress);
    let launch = batch.finalize(mailer)?;
    Ok(JobOutcome { launch, failures })
}

fn target_extension(source: &Path, requested: Option<&str>) -> Result<String> {
    if let Some(ext) = requested {
        return Ok(ext.to_string());
    }
    source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::InvalidPath(format!("'{}' has no extension separator", source.display()))
        })
}
