#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfglint-schema
//!
//! Platform-versioned schema registry and XML Schema compiler.
//!
//! A [`SchemaRegistry`] maps each [`PlatformVersion`] to the XSD document that
//! applies from that version on. Schemas are kept as re-openable byte sources
//! and compiled on demand by the [`SchemaLoader`] into the [`Schema`] model
//! used by the validator.

pub mod loader;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod version;

pub use loader::SchemaLoader;
pub use manifest::{ManifestSchema, RegistryManifest};
pub use model::{BuiltinType, ComplexType, ElementDecl, Particle, Schema, SimpleType, TypeRef};
pub use registry::{SchemaCatalog, SchemaEntry, SchemaRegistry, SchemaRegistryBuilder, SchemaSource};
pub use version::PlatformVersion;

use thiserror::Error;

/// Errors that can occur when working with schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema registry has no schemas")]
    EmptyRegistry,

    #[error("Schema registered twice for platform version {0}")]
    DuplicateVersion(PlatformVersion),

    #[error("Schema for platform version {version} is below the minimum supported version {floor}")]
    BelowFloor {
        version: PlatformVersion,
        floor: PlatformVersion,
    },

    #[error("Manifest error: {0}")]
    Manifest(String),
}

pub type Result<T> = std::result::Result<T, Error>;
