use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions recognised as declaration files.
pub const DECLARATION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Scanner collecting declaration files below a path.
///
/// The `DeclarationScanner` recursively walks a directory to find YAML and JSON declaration
/// files. It skips the `target` directory and hidden directories (those starting with `.`).
/// A path pointing at a single file yields that file.
///
/// # Example
///
/// ```no_run
/// use shapedoc::scanner::DeclarationScanner;
/// use std::path::PathBuf;
///
/// let scanner = DeclarationScanner::new(PathBuf::from("./shapes"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} declaration files", result.declaration_files.len());
/// ```
pub struct DeclarationScanner {
    root_path: PathBuf,
}

/// Result of a scan.
pub struct ScanResult {
    /// Discovered files, sorted by path
    pub declaration_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl DeclarationScanner {
    /// Creates a scanner rooted at `root_path`.
    ///
    /// # Arguments
    ///
    /// * `root_path` - A declaration directory, or a single declaration file
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the tree and collects every declaration file.
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning continues.
    ///
    /// # Returns
    ///
    /// A [`ScanResult`] holding the `.yaml`, `.yml` and `.json` files found, in
    /// file name order, together with any warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            anyhow::bail!("Declaration path does not exist: {}", self.root_path.display());
        }
        if self.root_path.is_file() {
            return Ok(ScanResult {
                declaration_files: vec![self.root_path.clone()],
                warnings: Vec::new(),
            });
        }

        let mut declaration_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && is_declaration(path) {
                        debug!("Found declaration file: {}", path.display());
                        declaration_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            declaration_files,
            warnings,
        })
    }
}

fn is_declaration(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| DECLARATION_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(result: &ScanResult) -> Vec<String> {
        result
            .declaration_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("cars.yaml"), "shapes: {}").unwrap();
        fs::write(root.join("boats.yml"), "shapes: {}").unwrap();
        fs::write(root.join("planes.json"), "{}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = DeclarationScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(names(&result), vec!["boats.yml", "cars.yaml", "planes.json"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("api/v1")).unwrap();
        fs::write(root.join("api/common.yaml"), "").unwrap();
        fs::write(root.join("api/v1/cars.yaml"), "").unwrap();

        let result = DeclarationScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(result.declaration_files.len(), 2);
    }

    #[test]
    fn test_scan_skips_hidden_and_target() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target/out.json"), "{}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.yaml"), "").unwrap();
        fs::write(root.join("cars.yaml"), "").unwrap();

        let result = DeclarationScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(names(&result), vec!["cars.yaml"]);
    }

    #[test]
    fn test_scan_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("cars.yaml");
        fs::write(&file, "").unwrap();

        let result = DeclarationScanner::new(file.clone()).scan().unwrap();
        assert_eq!(result.declaration_files, vec![file]);
    }

    #[test]
    fn test_scan_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(DeclarationScanner::new(missing).scan().is_err());
    }
}
