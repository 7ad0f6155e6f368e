//! Registry manifest files
//!
//! A manifest lists the schema documents of a registry and, optionally, the
//! file name and resource folder type a host should check:
//!
//! ```yaml
//! min_supported_version: 33
//! config_file_name: safety_center_config.xml
//! folder_type: raw
//! schemas:
//!   - version: 33
//!     path: schemas/safety_center_config_v33.xsd
//! ```
//!
//! Relative schema paths are resolved against the manifest's directory.

use crate::registry::{SchemaRegistry, SchemaSource};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Serializable registry description
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryManifest {
    pub min_supported_version: u32,
    #[serde(default)]
    pub config_file_name: Option<String>,
    #[serde(default)]
    pub folder_type: Option<String>,
    pub schemas: Vec<ManifestSchema>,
}

/// One schema document of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSchema {
    pub version: u32,
    pub path: PathBuf,
}

impl RegistryManifest {
    /// Read a manifest, choosing the format by file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Manifest`] when it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        trace!("Loading registry manifest from {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "json")
        {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse a YAML manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] on malformed YAML or unknown fields.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Manifest(format!("YAML parse error: {e}")))
    }

    /// Parse a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] on malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Manifest(format!("JSON parse error: {e}")))
    }

    /// Build the registry described by this manifest.
    ///
    /// # Errors
    ///
    /// Returns the registry builder's errors for malformed registries.
    pub fn build_registry(&self, base_dir: &Path) -> Result<SchemaRegistry> {
        self.schemas
            .iter()
            .fold(
                SchemaRegistry::builder(self.min_supported_version),
                |builder, schema| {
                    let path = if schema.path.is_absolute() {
                        schema.path.clone()
                    } else {
                        base_dir.join(&schema.path)
                    };
                    builder.register(schema.version, SchemaSource::file(path))
                },
            )
            .build()
    }
}
