//! Discovery of config files to check

use cfglint_schema::RegistryManifest;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Which files the host checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFilter {
    /// Exact file name of a config
    pub file_name: String,
    /// Resource folder type; qualifiers after the first `-` are ignored
    pub folder_type: String,
}

impl Default for HostFilter {
    fn default() -> Self {
        Self {
            file_name: "safety_center_config.xml".to_string(),
            folder_type: "raw".to_string(),
        }
    }
}

impl HostFilter {
    /// Default filter, overridden by the manifest's host settings
    pub fn from_manifest(manifest: &RegistryManifest) -> Self {
        let default = Self::default();
        Self {
            file_name: manifest.config_file_name.clone().unwrap_or(default.file_name),
            folder_type: manifest.folder_type.clone().unwrap_or(default.folder_type),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let name_matches = path.file_name().is_some_and(|n| *n == *self.file_name);
        let folder_matches = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .and_then(|folder| folder.split('-').next())
            .is_some_and(|folder_type| folder_type == self.folder_type);
        name_matches && folder_matches
    }
}

/// Collect the config files named by `paths`.
///
/// Files are kept when they pass the filter; directories are searched
/// recursively and their matches sorted. Symlinked directories are not
/// followed. The order of `paths` is preserved.
///
/// # Errors
///
/// Returns the I/O error of a path that does not exist or a directory that
/// cannot be read.
pub fn discover(paths: &[PathBuf], filter: &HostFilter) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if std::fs::metadata(path)?.is_dir() {
            let mut found = Vec::new();
            walk(path, filter, &mut found)?;
            found.sort();
            files.extend(found);
        } else if filter.matches(path) {
            files.push(path.clone());
        } else {
            debug!("Skipping {:?}: not a {} config", path, filter.file_name);
        }
    }
    Ok(files)
}

fn walk(dir: &Path, filter: &HostFilter, found: &mut Vec<PathBuf>) -> io::Result<()> {
    trace!("Scanning {:?}", dir);
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, filter, found)?;
        } else if file_type.is_symlink() && path.is_dir() {
            debug!("Skipping {:?}: symlinked directory", path);
        } else if filter.matches(&path) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_name_and_folder_type() {
        let filter = HostFilter::default();

        assert!(filter.matches(Path::new("res/raw-v34/safety_center_config.xml")));
        assert!(filter.matches(Path::new("res/raw/safety_center_config.xml")));
        assert!(filter.matches(Path::new("res/raw-night-v33/safety_center_config.xml")));
        assert!(!filter.matches(Path::new("res/raw-v34/other_config.xml")));
        assert!(!filter.matches(Path::new("res/xml-v34/safety_center_config.xml")));
        assert!(!filter.matches(Path::new("res/rawdata-v34/safety_center_config.xml")));
        assert!(!filter.matches(Path::new("safety_center_config.xml")));
    }

    #[test]
    fn test_manifest_overrides_filter() {
        let manifest = RegistryManifest::from_yaml_str(
            "min_supported_version: 1\nconfig_file_name: app.xml\nfolder_type: xml\nschemas: []\n",
        )
        .unwrap();
        let filter = HostFilter::from_manifest(&manifest);

        assert!(filter.matches(Path::new("res/xml-v2/app.xml")));
        assert!(!filter.matches(Path::new("res/raw-v2/safety_center_config.xml")));
    }

    #[test]
    fn test_discover_walks_directories_in_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for folder in ["raw-v34", "raw-v33", "values", "raw-v33/nested"] {
            std::fs::create_dir_all(dir.path().join(folder))?;
        }
        for file in [
            "raw-v34/safety_center_config.xml",
            "raw-v33/safety_center_config.xml",
            "raw-v33/other.xml",
            "values/safety_center_config.xml",
        ] {
            std::fs::write(dir.path().join(file), "<x/>")?;
        }

        let files = discover(&[dir.path().to_path_buf()], &HostFilter::default())?;
        assert_eq!(
            files,
            vec![
                dir.path().join("raw-v33/safety_center_config.xml"),
                dir.path().join("raw-v34/safety_center_config.xml"),
            ]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_does_not_follow_directory_symlinks() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("raw-v33"))?;
        std::fs::write(dir.path().join("raw-v33/safety_center_config.xml"), "<x/>")?;
        std::os::unix::fs::symlink("..", dir.path().join("raw-v33/up"))?;

        let files = discover(&[dir.path().to_path_buf()], &HostFilter::default())?;
        assert_eq!(files, vec![dir.path().join("raw-v33/safety_center_config.xml")]);
        Ok(())
    }

    #[test]
    fn test_discover_missing_path_is_error() {
        let result = discover(&[PathBuf::from("/nonexistent/res")], &HostFilter::default());
        assert!(result.is_err());
    }
}
