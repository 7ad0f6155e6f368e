//! Platform-versioned schema registry

use crate::manifest::RegistryManifest;
use crate::version::PlatformVersion;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A schema document that can be opened any number of times
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaSource {
    /// Bytes held by the process
    Embedded { name: String, bytes: Arc<[u8]> },
    /// A file read on every open
    File(PathBuf),
}

impl SchemaSource {
    /// A schema held in memory
    pub fn embedded(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Embedded {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// A schema read from `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Open a fresh stream over the schema bytes.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while opening a file source.
    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send + '_>> {
        match self {
            Self::Embedded { bytes, .. } => Ok(Box::new(Cursor::new(&bytes[..]))),
            Self::File(path) => Ok(Box::new(std::fs::File::open(path)?)),
        }
    }

    /// Read the whole schema as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while opening or reading the source,
    /// including invalid UTF-8.
    pub fn read_to_string(&self) -> std::io::Result<String> {
        let mut text = String::new();
        self.open()?.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Whether the source can currently be opened
    #[must_use]
    pub fn is_available(&self) -> bool {
        match self {
            Self::Embedded { .. } => true,
            Self::File(path) => path.is_file(),
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded { name, .. } => write!(f, "embedded:{name}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A schema registered for a platform version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaEntry {
    pub version: PlatformVersion,
    pub source: SchemaSource,
}

/// Read access to versioned schemas.
///
/// Implemented by [`SchemaRegistry`]; the checker only depends on this trait
/// so tests can substitute synthetic catalogs.
pub trait SchemaCatalog: Send + Sync {
    /// The schema registered for exactly `version`
    fn schema_for(&self, version: PlatformVersion) -> Option<SchemaEntry>;

    /// Lowest version a downward search may reach
    fn min_supported_version(&self) -> PlatformVersion;

    /// Highest version with a registered schema
    fn max_registered_version(&self) -> PlatformVersion;
}

/// Immutable mapping from platform version to schema document
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    floor: PlatformVersion,
    entries: BTreeMap<PlatformVersion, SchemaEntry>,
}

impl SchemaRegistry {
    /// Start building a registry whose downward search stops at `floor`
    pub fn builder(floor: impl Into<PlatformVersion>) -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            floor: floor.into(),
            entries: Vec::new(),
        }
    }

    /// Load a registry from a YAML or JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns an error when the manifest cannot be read or parsed, or when
    /// the registry it describes is malformed.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let manifest = RegistryManifest::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        manifest.build_registry(base_dir)
    }

    /// Registered versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = PlatformVersion> + '_ {
        self.entries.keys().copied()
    }

    /// Registered entries in ascending version order
    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> + '_ {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SchemaCatalog for SchemaRegistry {
    fn schema_for(&self, version: PlatformVersion) -> Option<SchemaEntry> {
        let entry = self.entries.get(&version)?;
        if entry.source.is_available() {
            Some(entry.clone())
        } else {
            warn!(
                "Schema for platform version {} is registered but {} is missing",
                version, entry.source
            );
            None
        }
    }

    fn min_supported_version(&self) -> PlatformVersion {
        self.floor
    }

    fn max_registered_version(&self) -> PlatformVersion {
        self.entries
            .keys()
            .next_back()
            .copied()
            .unwrap_or(self.floor)
    }
}

/// Collects schema entries and validates them into a [`SchemaRegistry`]
#[derive(Debug, Clone)]
pub struct SchemaRegistryBuilder {
    floor: PlatformVersion,
    entries: Vec<SchemaEntry>,
}

impl SchemaRegistryBuilder {
    /// Register `source` as the schema for `version`
    #[must_use]
    pub fn register(mut self, version: impl Into<PlatformVersion>, source: SchemaSource) -> Self {
        self.entries.push(SchemaEntry {
            version: version.into(),
            source,
        });
        self
    }

    /// Validate the collected entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRegistry`] when nothing was registered,
    /// [`Error::DuplicateVersion`] when a version was registered twice and
    /// [`Error::BelowFloor`] when a version is below the floor.
    pub fn build(self) -> Result<SchemaRegistry> {
        if self.entries.is_empty() {
            return Err(Error::EmptyRegistry);
        }

        let mut entries = BTreeMap::new();
        for entry in self.entries {
            if entry.version < self.floor {
                return Err(Error::BelowFloor {
                    version: entry.version,
                    floor: self.floor,
                });
            }
            if !entry.source.is_available() {
                warn!(
                    "Schema source {} for platform version {} does not exist",
                    entry.source, entry.version
                );
            }
            let version = entry.version;
            if entries.insert(version, entry).is_some() {
                return Err(Error::DuplicateVersion(version));
            }
        }

        debug!(
            "Built schema registry: floor {}, {} schema(s)",
            self.floor,
            entries.len()
        );
        Ok(SchemaRegistry {
            floor: self.floor,
            entries,
        })
    }
}
