use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Recursive scanner locating candidate source files for the compiler.
///
/// Walks the project directory collecting `.rs` files, skipping build
/// artifacts (`target`) and hidden directories. An optional filter limits the
/// candidates to files whose name contains a given string, which is the usual
/// way to restrict a run to controller files (e.g. `--filter-by-name
/// controller`).
pub struct FileScanner {
    root_path: PathBuf,
    filter_by_name: Option<String>,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// All discovered candidate files
    pub rust_files: Vec<PathBuf>,
    /// Warnings for paths that could not be accessed
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            filter_by_name: None,
        }
    }

    /// Restricts the scan to files whose name contains `filter`.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter_by_name = filter;
        self
    }

    /// Walks the directory tree and collects candidate files.
    ///
    /// Inaccessible entries produce warnings but do not stop the scan.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path).into_iter().filter_entry(|e| {
            if e.path() == self.root_path {
                return true;
            }

            let file_name = e.file_name().to_string_lossy();
            let is_hidden = file_name.starts_with('.');
            let is_target = file_name == "target";

            !is_hidden && !is_target
        }) {
            match entry {
                Ok(entry) => {
                    let path = entry.path();

                    if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("rs") {
                        continue;
                    }

                    if let Some(filter) = &self.filter_by_name {
                        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                        if !name.contains(filter.as_str()) {
                            continue;
                        }
                    }

                    rust_files.push(path.to_path_buf());
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}
