//! Export side of a mail batch: writing images to temporary files and
//! accumulating the results.

pub mod batch;
pub mod temp;

use std::path::Path;

pub use batch::{Batch, BatchState};

/// Writes one image to a target file.
///
/// Image decoding and encoding live outside this crate; implementors wrap
/// whatever pipeline produces the file.
pub trait ImageExporter: Send + Sync {
    fn export(&self, image_id: u32, source: &Path, target: &Path) -> std::io::Result<()>;
}

/// Exporter that copies the source file byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyExporter;

impl ImageExporter for CopyExporter {
    fn export(&self, _image_id: u32, source: &Path, target: &Path) -> std::io::Result<()> {
        std::fs::copy(source, target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_exporter() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        let target = dir.path().join("a.png");
        std::fs::write(&source, b"pixels").unwrap();

        CopyExporter.export(1, &source, &target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"pixels");
    }

    #[test]
    fn test_copy_exporter_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = CopyExporter.export(1, &dir.path().join("nope.jpg"), &dir.path().join("x"));
        assert!(result.is_err());
    }
}
