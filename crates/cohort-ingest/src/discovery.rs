//! File discovery and prefix matching.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, Result};

/// List all CSV files under `dir`, recursing into subdirectories.
///
/// Extension matching is case-insensitive. Results are sorted by full path
/// for deterministic iteration.
pub fn list_csv_files_recursive(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    visit(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn visit(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            visit(&path, files)?;
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            files.push(path);
        }
    }
    Ok(())
}

/// Select files whose name starts with one of `prefixes`.
///
/// Order is prefix-major (all files for the first prefix, then the second,
/// and so on), which fixes the merge order downstream. A file matching more
/// than one prefix is returned once, at its first match.
pub fn files_matching_prefixes(files: &[PathBuf], prefixes: &[String]) -> Vec<PathBuf> {
    let mut matched: Vec<PathBuf> = Vec::new();
    for prefix in prefixes {
        let mut any = false;
        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if name.starts_with(prefix.as_str()) && !matched.contains(path) {
                matched.push(path.clone());
                any = true;
            }
        }
        if !any {
            debug!(prefix = %prefix, "no csv file found for prefix");
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("archive")).unwrap();
        for name in &[
            "Demographics_07Aug2026.csv",
            "Age_at_visit.csv",
            "Participant_Status.CSV",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "PATNO\n1\n").unwrap();
        }
        std::fs::write(
            dir.path().join("archive").join("Demographics_old.csv"),
            "PATNO\n1\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn lists_csv_files_recursively() {
        let dir = create_test_dir();
        let files = list_csv_files_recursive(dir.path()).unwrap();
        assert_eq!(files.len(), 4);
        assert!(files.iter().any(|p| p.ends_with("archive/Demographics_old.csv")));
        assert!(!files.iter().any(|p| p.ends_with("notes.txt")));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let result = list_csv_files_recursive(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
    }

    #[test]
    fn prefix_matching_is_prefix_major_and_deduplicated() {
        let dir = create_test_dir();
        let files = list_csv_files_recursive(dir.path()).unwrap();
        let prefixes = vec![
            "Participant_Status".to_string(),
            "Demographics".to_string(),
            "Demographics_07".to_string(),
            "Gait_Data".to_string(),
        ];
        let matched = files_matching_prefixes(&files, &prefixes);
        assert_eq!(matched.len(), 3);
        // Participant_Status first, then both Demographics files; the
        // narrower Demographics_07 prefix adds nothing new.
        assert!(
            matched[0]
                .file_name()
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("Participant_Status")
        );
    }
}
