//! Platform version resolution from config locations

use cfglint_schema::PlatformVersion;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a config's platform version could not be determined
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Config file {0:?} is not inside a resource folder")]
    NoParentDirectory(PathBuf),

    #[error("Resource folder '{0}' has no platform version qualifier")]
    MissingQualifier(String),

    #[error("Platform version qualifier '{0}' is out of range")]
    OutOfRange(String),
}

/// Determines the platform version a config targets
pub trait VersionResolver: Send + Sync {
    /// Resolve the version of the config stored at `location`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the location carries no usable version.
    fn resolve(&self, location: &Path) -> Result<PlatformVersion, ResolveError>;
}

/// Reads the `v<N>` qualifier of the config's resource folder.
///
/// The folder name is split on `-`; the first segment is the folder type
/// (`raw`) and the last `v<digits>` segment among the rest is the version,
/// so `raw-v34` and `raw-night-v33` both resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifierVersionResolver;

impl VersionResolver for QualifierVersionResolver {
    fn resolve(&self, location: &Path) -> Result<PlatformVersion, ResolveError> {
        let folder = location
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .ok_or_else(|| ResolveError::NoParentDirectory(location.to_path_buf()))?;

        let digits = folder
            .split('-')
            .skip(1)
            .filter_map(|qualifier| qualifier.strip_prefix('v'))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .last()
            .ok_or_else(|| ResolveError::MissingQualifier(folder.to_string()))?;

        digits
            .parse::<u32>()
            .map(PlatformVersion::new)
            .map_err(|_| ResolveError::OutOfRange(format!("v{digits}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str) -> Result<PlatformVersion, ResolveError> {
        QualifierVersionResolver.resolve(Path::new(path))
    }

    #[test]
    fn test_version_qualifier() {
        assert_eq!(
            resolve("res/raw-v34/safety_center_config.xml"),
            Ok(PlatformVersion::new(34))
        );
        assert_eq!(
            resolve("/abs/res/raw-night-v33/safety_center_config.xml"),
            Ok(PlatformVersion::new(33))
        );
    }

    #[test]
    fn test_missing_qualifier() {
        assert_eq!(
            resolve("res/raw/safety_center_config.xml"),
            Err(ResolveError::MissingQualifier("raw".to_string()))
        );
        assert_eq!(
            resolve("res/raw-night/safety_center_config.xml"),
            Err(ResolveError::MissingQualifier("raw-night".to_string()))
        );
    }

    #[test]
    fn test_folder_type_is_not_a_qualifier() {
        assert!(matches!(
            resolve("res/v34/safety_center_config.xml"),
            Err(ResolveError::MissingQualifier(_))
        ));
    }

    #[test]
    fn test_malformed_qualifiers_are_ignored() {
        assert!(resolve("res/raw-v/safety_center_config.xml").is_err());
        assert!(resolve("res/raw-v3x/safety_center_config.xml").is_err());
    }

    #[test]
    fn test_no_parent_directory() {
        assert!(matches!(
            resolve("safety_center_config.xml"),
            Err(ResolveError::NoParentDirectory(_))
        ));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            resolve("res/raw-v99999999999/safety_center_config.xml"),
            Err(ResolveError::OutOfRange("v99999999999".to_string()))
        );
    }
}
