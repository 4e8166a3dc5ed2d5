use crate::config::FileFilter;
use crate::error::{ProcessingError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists the regular files of one directory that pass the name filter.
pub struct FileDiscovery {
    filter: FileFilter,
}

impl FileDiscovery {
    pub fn new(filter: FileFilter) -> Self {
        Self { filter }
    }

    /// Non-recursive; sorted by file name so runs are reproducible.
    pub fn discover(&self, dir_path: &Path) -> Result<Vec<PathBuf>> {
        if !dir_path.is_dir() {
            return Err(ProcessingError::Config(format!(
                "Path is not a directory: {}",
                dir_path.display()
            )));
        }

        let mut files = Vec::new();

        for entry in fs::read_dir(dir_path)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if self.filter.matches(file_name) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        debug!(
            "Found {} candidate files in {}",
            files.len(),
            dir_path.display()
        );

        Ok(files)
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new(FileFilter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_folder(temp_dir: &TempDir) {
        let root = temp_dir.path();
        fs::write(root.join("precip_b.dat"), "S1 2006 1 0").unwrap();
        fs::write(root.join("precip_a.dat"), "S1 2006 1 0").unwrap();
        fs::write(root.join("temp_a.dat"), "S1 2006 1 0").unwrap();
        fs::write(root.join("precip_c.txt"), "S1 2006 1 0").unwrap();
        fs::create_dir(root.join("nested.dat")).unwrap();
    }

    #[test]
    fn test_discover_by_suffix() {
        let temp_dir = TempDir::new().unwrap();
        create_test_folder(&temp_dir);

        let files = FileDiscovery::new(FileFilter::with_suffix(".dat"))
            .discover(temp_dir.path())
            .unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        // directories are skipped even when the name matches
        assert_eq!(names, vec!["precip_a.dat", "precip_b.dat", "temp_a.dat"]);
    }

    #[test]
    fn test_discover_by_prefix() {
        let temp_dir = TempDir::new().unwrap();
        create_test_folder(&temp_dir);

        let files = FileDiscovery::new(FileFilter::with_prefix("precip"))
            .discover(temp_dir.path())
            .unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|p| p
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("precip")));
    }

    #[test]
    fn test_discover_empty_folder() {
        let temp_dir = TempDir::new().unwrap();
        let files = FileDiscovery::default().discover(temp_dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let result = FileDiscovery::default().discover(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(ProcessingError::Config(_))));
    }
}
