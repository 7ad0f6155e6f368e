//! Compiled schema cache shared across validation threads

use cfglint_schema::{Schema, SchemaEntry};
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent map from registry entry to its compiled schema
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: DashMap<SchemaEntry, Arc<Schema>>,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled schema for `entry`, if it has been compiled before
    #[must_use]
    pub fn get(&self, entry: &SchemaEntry) -> Option<Arc<Schema>> {
        self.schemas.get(entry).map(|schema| Arc::clone(schema.value()))
    }

    pub fn insert(&self, entry: SchemaEntry, schema: Arc<Schema>) {
        self.schemas.insert(entry, schema);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn clear(&self) {
        self.schemas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfglint_schema::{PlatformVersion, SchemaSource};

    fn entry(version: u32) -> SchemaEntry {
        SchemaEntry {
            version: PlatformVersion::new(version),
            source: SchemaSource::embedded("config.xsd", b"<xs:schema/>".to_vec()),
        }
    }

    #[test]
    fn test_entries_are_keyed_by_version_and_source() {
        let cache = SchemaCache::new();
        cache.insert(entry(33), Arc::new(Schema::default()));

        assert!(cache.get(&entry(33)).is_some());
        assert!(cache.get(&entry(34)).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
