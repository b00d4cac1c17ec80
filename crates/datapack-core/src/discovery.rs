//! Locating and categorizing raw export files in a drop directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Extensions of files that are pipeline outputs rather than raw exports.
const SKIP_EXTENSIONS: [&str; 3] = ["parquet", "csv", "xlsx"];

#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    pub mfc_files: Vec<PathBuf>,
    pub datalog_files: Vec<PathBuf>,
}

/// Scans `directory` (one level deep) and separates MFC exports from datalog
/// exports. A file is MFC when its name contains "mfc", case-insensitively;
/// converted outputs (parquet/csv/xlsx) are skipped. Both lists come back
/// sorted.
pub fn discover_files(directory: &Path) -> Result<DiscoveredFiles> {
    if !directory.is_dir() {
        return Err(PipelineError::Validation(format!(
            "path is not a directory: {}",
            directory.display()
        )));
    }

    let mut discovered = DiscoveredFiles::default();

    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        if extension.is_some_and(|ext| SKIP_EXTENSIONS.contains(&ext.as_str())) {
            continue;
        }

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if name.contains("mfc") {
            discovered.mfc_files.push(path);
        } else {
            discovered.datalog_files.push(path);
        }
    }

    discovered.mfc_files.sort();
    discovered.datalog_files.sort();
    Ok(discovered)
}
