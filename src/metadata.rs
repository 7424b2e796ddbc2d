//! One-line image summaries used in the mail body.

use std::collections::HashMap;
use std::path::PathBuf;

use humansize::{format_size, BINARY};

/// Produces the one-line description printed next to each attachment.
pub trait MetadataSource: Send + Sync {
    fn summary(&self, image_id: u32) -> String;
}

/// Leaves the description empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn summary(&self, _image_id: u32) -> String {
        String::new()
    }
}

/// Describes each image by its source file size.
#[derive(Debug, Clone, Default)]
pub struct FileSizeSummary {
    sources: HashMap<u32, PathBuf>,
}

impl FileSizeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the source file of an image.
    pub fn insert(&mut self, image_id: u32, source: impl Into<PathBuf>) {
        self.sources.insert(image_id, source.into());
    }
}

impl MetadataSource for FileSizeSummary {
    fn summary(&self, image_id: u32) -> String {
        let Some(path) = self.sources.get(&image_id) else {
            return String::new();
        };
        match std::fs::metadata(path) {
            Ok(meta) => format!("({})", format_size(meta.len(), BINARY)),
            Err(e) => {
                tracing::debug!(image_id, error = %e, "Cannot read image metadata");
                String::new()
            }
        }
    }
}
