use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker an entry name must contain to count as an input file
pub const TEXT_MARKER: &str = ".txt";

/// Input files directly inside `dir`, sorted by name.
///
/// An entry qualifies when its name *contains* [`TEXT_MARKER`] anywhere, so
/// `notes.txt.bak` is included. Subdirectories are not searched. A directory
/// that cannot be listed yields no files.
pub fn txt_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "cannot list input directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(TEXT_MARKER))
        .map(|entry| entry.path())
        .collect();
    files.sort();

    debug!(dir = %dir.display(), count = files.len(), "input files found");
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_matches_by_substring() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.txt", "notes.txt.bak", "readme.md", "nottxt.docx"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let names: Vec<String> = txt_files(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "notes.txt.bak"]);
    }

    #[test]
    fn test_does_not_recurse() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("inner.txt"), "x").unwrap();

        assert!(txt_files(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(txt_files(&dir.path().join("absent")).is_empty());
    }
}
