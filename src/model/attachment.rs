//! Attachment records accumulated by a batch.
//!
//! A record only links an image to the file it was exported to. The file
//! itself is owned by whoever created it; records never delete anything.

use std::path::{Path, PathBuf};

/// An exported image waiting to be attached to the outgoing mail.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttachmentRecord {
    /// Identifier of the image in the caller's library.
    pub image_id: u32,

    /// Absolute path of the exported file.
    pub file: PathBuf,
}

impl AttachmentRecord {
    pub fn new(image_id: u32, file: impl Into<PathBuf>) -> Self {
        Self {
            image_id,
            file: file.into(),
        }
    }

    /// File name of the exported file, as shown in the mail body.
    pub fn basename(&self) -> String {
        basename(&self.file)
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        let rec = AttachmentRecord::new(7, "/tmp/export/IMG_0001.png");
        assert_eq!(rec.basename(), "IMG_0001.png");
    }

    #[test]
    fn test_basename_without_file_name() {
        let rec = AttachmentRecord::new(7, "/");
        assert_eq!(rec.basename(), "/");
    }
}
