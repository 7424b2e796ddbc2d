//! Accumulate exported attachments for a single mail.
//!
//! A [`Batch`] is created when an export job starts, fed once per exported
//! image and consumed by [`Batch::finalize`] or [`Batch::cancel`]. Both take
//! the batch by value: once a batch is finalizing, nothing can store into it
//! anymore.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::launch::LaunchHandle;
use crate::mailer::Mailer;
use crate::model::attachment::AttachmentRecord;

use super::temp::{progress_message, temp_target};
use super::ImageExporter;

/// Observable lifecycle of a batch.
///
/// The finalizing state is not observable: [`Batch::finalize`] consumes the
/// batch, so no reference to it survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No attachment stored yet.
    Idle,
    /// At least one attachment stored.
    Accumulating,
}

/// Ordered set of attachments exported for one mail.
pub struct Batch {
    exporter: Box<dyn ImageExporter>,
    temp_dir: PathBuf,
    records: Mutex<Records>,
}

/// Stored records plus the targets claimed by exports still running.
#[derive(Debug, Default)]
struct Records {
    list: Vec<AttachmentRecord>,
    claimed: HashSet<PathBuf>,
}

impl Batch {
    /// Create an empty batch exporting into the system temporary directory.
    pub fn new(exporter: impl ImageExporter + 'static) -> Self {
        Self {
            exporter: Box::new(exporter),
            temp_dir: std::env::temp_dir(),
            records: Mutex::new(Records::default()),
        }
    }

    /// Export into `dir` instead of the system temporary directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Export `source` to the temporary directory and record it.
    ///
    /// The exported file keeps the source stem and takes `extension`.
    /// Failures leave the batch untouched. A target that is the source
    /// itself, or that another image of the batch already uses, is rejected
    /// with [`Error::InvalidPath`] before anything is written.
    pub fn store(&self, image_id: u32, source: &Path, extension: &str) -> Result<AttachmentRecord> {
        let target = temp_target(&self.temp_dir, source, extension)?;

        if same_file(source, &target) {
            return Err(Error::InvalidPath(format!(
                "exporting '{}' would overwrite its own source",
                source.display()
            )));
        }

        // The target is claimed before exporting so that concurrent stores
        // of images sharing a stem cannot write the same file.
        if !self.lock().claimed.insert(target.clone()) {
            return Err(Error::InvalidPath(format!(
                "'{}' is already used by another image of this batch",
                target.display()
            )));
        }

        if let Err(e) = self.exporter.export(image_id, source, &target) {
            self.lock().claimed.remove(&target);
            return Err(Error::io(&target, e));
        }

        let record = AttachmentRecord::new(image_id, target);
        self.lock().list.push(record.clone());

        tracing::debug!(
            image_id,
            file = %record.file.display(),
            "Stored attachment"
        );
        Ok(record)
    }

    /// Same as [`Batch::store`], reporting `index/total` progress on success.
    pub fn store_numbered(
        &self,
        image_id: u32,
        source: &Path,
        extension: &str,
        index: usize,
        total: usize,
    ) -> Result<AttachmentRecord> {
        let record = self.store(image_id, source, extension)?;
        tracing::info!("{}", progress_message(index, total, &record.file));
        Ok(record)
    }

    pub fn state(&self) -> BatchState {
        if self.lock().list.is_empty() {
            BatchState::Idle
        } else {
            BatchState::Accumulating
        }
    }

    pub fn len(&self) -> usize {
        self.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().list.is_empty()
    }

    /// Snapshot of the stored records, in completion order.
    pub fn records(&self) -> Vec<AttachmentRecord> {
        self.lock().list.clone()
    }

    /// Compose the mail for every stored attachment and hand it to the
    /// mail client.
    ///
    /// An empty batch fails with [`Error::EmptyBatch`] and dispatches
    /// nothing. Exported files are left on disk whatever the outcome, since
    /// the mail client reads them after this returns.
    pub fn finalize(self, mailer: &Mailer) -> Result<LaunchHandle> {
        let records = self.into_records();
        if records.is_empty() {
            tracing::warn!("Finalize called on an empty batch");
            return Err(Error::EmptyBatch);
        }

        mailer.send(&records).inspect_err(|e| {
            tracing::error!(
                attachments = records.len(),
                error = %e,
                "Mail composition failed, exported files kept on disk"
            );
        })
    }

    /// Drop the batch and delete every exported file.
    ///
    /// Returns the number of files removed. Files already gone are skipped.
    pub fn cancel(self) -> Result<usize> {
        let records = self.into_records();
        let mut removed = 0;

        for record in &records {
            match std::fs::remove_file(&record.file) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(&record.file, e)),
            }
        }

        tracing::info!(removed, "Cancelled batch");
        Ok(removed)
    }

    fn into_records(self) -> Vec<AttachmentRecord> {
        self.records
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .list
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        // A panicking exporter never holds the lock, so the list stays valid.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `true` when both paths name the same file, or the same missing path.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("temp_dir", &self.temp_dir)
            .field("records", &self.records())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::CopyExporter;

    fn source(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_store_appends_in_order() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());

        assert_eq!(batch.state(), BatchState::Idle);
        batch.store(1, &source(src.path(), "a.jpg"), "png").unwrap();
        batch.store(2, &source(src.path(), "b.jpg"), "png").unwrap();
        assert_eq!(batch.state(), BatchState::Accumulating);

        let records = batch.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], AttachmentRecord::new(1, tmp.path().join("a.png")));
        assert_eq!(records[1], AttachmentRecord::new(2, tmp.path().join("b.png")));
        assert!(tmp.path().join("a.png").exists());
    }

    #[test]
    fn test_store_failure_is_isolated() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());

        let err = batch.store(1, &src.path().join("missing.jpg"), "png").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));

        let err = batch.store(2, &source(src.path(), "noext"), "png").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));

        batch.store(3, &source(src.path(), "c.jpg"), "png").unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].image_id, 3);
    }

    #[test]
    fn test_concurrent_store() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());
        let sources: Vec<PathBuf> = (0..16)
            .map(|i| source(src.path(), &format!("img{i}.jpg")))
            .collect();

        std::thread::scope(|s| {
            for (i, path) in sources.iter().enumerate() {
                let batch = &batch;
                s.spawn(move || batch.store(i as u32, path, "png").unwrap());
            }
        });

        let mut ids: Vec<u32> = batch.records().iter().map(|r| r.image_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_cancel_removes_exported_files() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());
        batch.store(1, &source(src.path(), "a.jpg"), "png").unwrap();
        batch.store(2, &source(src.path(), "b.jpg"), "png").unwrap();
        std::fs::remove_file(tmp.path().join("b.png")).unwrap();

        assert_eq!(batch.cancel().unwrap(), 1);
        assert!(!tmp.path().join("a.png").exists());
        // Sources are never touched.
        assert!(src.path().join("a.jpg").exists());
    }

    #[test]
    fn test_store_never_overwrites_its_source() {
        let tmp = tempfile::tempdir().unwrap();
        let photo = tmp.path().join("photo.jpg");
        std::fs::write(&photo, b"precious pixels").unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());

        let err = batch.store(1, &photo, "jpg").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert_eq!(std::fs::read(&photo).unwrap(), b"precious pixels");
        assert!(batch.is_empty());

        // Another extension is a different file and is fine.
        batch.store(1, &photo, "png").unwrap();
        assert_eq!(std::fs::read(&photo).unwrap(), b"precious pixels");
    }

    #[test]
    fn test_store_rejects_target_used_by_another_image() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("a")).unwrap();
        std::fs::create_dir_all(src.path().join("b")).unwrap();
        let first = src.path().join("a").join("img.jpg");
        let second = src.path().join("b").join("img.jpg");
        std::fs::write(&first, b"AAAA").unwrap();
        std::fs::write(&second, b"BB").unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());

        batch.store(1, &first, "png").unwrap();
        let err = batch.store(2, &second, "png").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));

        assert_eq!(batch.records(), vec![AttachmentRecord::new(1, tmp.path().join("img.png"))]);
        assert_eq!(std::fs::read(tmp.path().join("img.png")).unwrap(), b"AAAA");
    }

    #[test]
    fn test_failed_export_releases_its_target() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());

        assert!(batch.store(1, &src.path().join("a.jpg"), "png").is_err());
        batch.store(1, &source(src.path(), "a.jpg"), "png").unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_store_numbered_logs_progress() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let batch = Batch::new(CopyExporter).with_temp_dir(tmp.path());

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        let record = tracing::subscriber::with_default(subscriber, || {
            batch
                .store_numbered(1, &source(src.path(), "a.jpg"), "png", 2, 5)
                .unwrap()
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let expected = progress_message(2, 5, &record.file);
        assert!(output.contains(&expected), "{output}");
        assert!(output.contains("2/5 exported to '"), "{output}");
    }
}
