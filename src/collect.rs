//! Source file discovery.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collect every `.json` file under `root`, as absolute paths.
///
/// The walk order of the filesystem is not meaningful, so the result is
/// sorted to keep runs reproducible. A missing or empty root yields an
/// empty list rather than an error.
pub fn collect_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .map(|entry| {
            entry
                .path()
                .canonicalize()
                .unwrap_or_else(|_| entry.path().to_path_buf())
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collects_json_recursively_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("2018").join("11");
        fs::create_dir_all(&nested).unwrap();

        fs::write(temp_dir.path().join("b.json"), "{}").unwrap();
        fs::write(nested.join("a.json"), "{}").unwrap();
        fs::write(nested.join("notes.txt"), "skip me").unwrap();

        let files = collect_json_files(temp_dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.is_absolute()));

        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_empty_root_yields_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        assert!(collect_json_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_missing_root_yields_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does_not_exist");
        assert!(collect_json_files(&missing).is_empty());
    }
}
