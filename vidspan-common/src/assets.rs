use std::path::Path;

use crate::error::{AssetError, VidspanError};
use crate::Result;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "webm", "m4v"];

/// Checks a video file at selection time. Existence is a hard error;
/// an unrecognized extension only warns, since players accept more
/// container formats than this list names.
pub fn validate_asset(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(VidspanError::Asset(AssetError::NotFound {
            path: path.to_path_buf(),
        }));
    }

    if !path.is_file() {
        return Err(VidspanError::Asset(AssetError::NotAFile {
            path: path.to_path_buf(),
        }));
    }

    if !has_supported_extension(path) {
        log::warn!("Unrecognized video extension for {:?}, assigning anyway", path);
    }

    Ok(())
}

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_validate_existing_video_file() {
        let temp_dir = tempdir().unwrap();
        let video = temp_dir.path().join("clip.mp4");
        fs::write(&video, "fake video").unwrap();

        assert!(validate_asset(&video).is_ok());
    }

    #[test]
    fn test_validate_missing_file() {
        let result = validate_asset(Path::new("/nonexistent/clip.mp4"));

        match result.unwrap_err() {
            VidspanError::Asset(AssetError::NotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/clip.mp4"));
            }
            other => panic!("Expected AssetError::NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_directory_rejected() {
        let temp_dir = tempdir().unwrap();

        let result = validate_asset(temp_dir.path());

        match result.unwrap_err() {
            VidspanError::Asset(AssetError::NotAFile { .. }) => {}
            other => panic!("Expected AssetError::NotAFile, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_extension_is_accepted() {
        let temp_dir = tempdir().unwrap();
        let oddball = temp_dir.path().join("clip.ts");
        fs::write(&oddball, "fake video").unwrap();

        assert!(validate_asset(&oddball).is_ok());
        assert!(!has_supported_extension(&oddball));
    }

    #[test]
    fn test_supported_extensions_case_insensitive() {
        assert!(has_supported_extension(Path::new("a.MP4")));
        assert!(has_supported_extension(Path::new("b.MkV")));
        assert!(!has_supported_extension(Path::new("c.txt")));
        assert!(!has_supported_extension(Path::new("noext")));
    }
}
