//! Temporary file naming and progress messages for exported images.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Number of trailing bytes of a path kept in progress messages.
pub const PROGRESS_PATH_BYTES: usize = 32;

/// Build the temporary path for an exported image.
///
/// The source file name keeps its stem and gets `extension` instead of its
/// own: `/photos/a.jpg` with `png` becomes `<dir>/a.png`.
pub fn temp_target(dir: &Path, source: &Path, extension: &str) -> Result<PathBuf> {
    let filename = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(format!("no file name in '{}'", source.display())))?;

    let (stem, _) = filename.rsplit_once('.').ok_or_else(|| {
        Error::InvalidPath(format!("'{filename}' has no extension separator"))
    })?;

    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return Err(Error::InvalidPath(format!(
            "empty target extension for '{filename}'"
        )));
    }

    Ok(dir.join(format!("{stem}.{extension}")))
}

/// Keep the last [`PROGRESS_PATH_BYTES`] bytes of a path for display.
///
/// Shortened paths start with `..`. The cut never splits a character.
pub fn shorten_path(path: &str) -> String {
    if path.len() <= PROGRESS_PATH_BYTES {
        return path.to_string();
    }

    let mut start = path.len() - PROGRESS_PATH_BYTES;
    while !path.is_char_boundary(start) {
        start += 1;
    }
    format!("..{}", &path[start..])
}

/// Progress line emitted after each numbered export.
pub fn progress_message(index: usize, total: usize, file: &Path) -> String {
    let path = shorten_path(&file.to_string_lossy());
    format!("{index}/{total} exported to '{path}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_target_swaps_extension() {
        let target = temp_target(Path::new("/tmp"), Path::new("/photos/a.jpg"), "png").unwrap();
        assert_eq!(target, PathBuf::from("/tmp/a.png"));
    }

    #[test]
    fn test_temp_target_keeps_inner_dots() {
        let target =
            temp_target(Path::new("/tmp"), Path::new("/photos/IMG.0001.CR2"), ".jpg").unwrap();
        assert_eq!(target, PathBuf::from("/tmp/IMG.0001.jpg"));
    }

    #[test]
    fn test_temp_target_without_extension() {
        let err = temp_target(Path::new("/tmp"), Path::new("/photos/README"), "png").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn test_temp_target_empty_extension() {
        let err = temp_target(Path::new("/tmp"), Path::new("a.jpg"), "").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn test_shorten_short_path_untouched() {
        assert_eq!(shorten_path("/tmp/a.png"), "/tmp/a.png");
    }

    #[test]
    fn test_shorten_long_path() {
        let path = "/home/someone/very/long/directory/name/IMG_0001.png";
        let short = shorten_path(path);
        assert!(short.starts_with(".."));
        assert_eq!(short.len(), 2 + PROGRESS_PATH_BYTES);
        assert!(short.ends_with("IMG_0001.png"));
    }

    #[test]
    fn test_shorten_respects_char_boundaries() {
        // Each 'é' is two bytes, so a 32-byte cut may land mid-character.
        let path = format!("/{}x", "é".repeat(40));
        let short = shorten_path(&path);
        assert!(short.starts_with(".."));
        assert!(short.ends_with("éx"));
        assert_eq!(short.len() - 2, PROGRESS_PATH_BYTES - 1);
    }

    #[test]
    fn test_progress_message() {
        let msg = progress_message(2, 5, Path::new("/tmp/a.png"));
        assert_eq!(msg, "2/5 exported to '/tmp/a.png'");
    }
}
