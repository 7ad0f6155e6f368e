#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfglint-validation
//!
//! XML Schema validation of config documents.
//!
//! The [`SchemaValidator`] reads a registered schema and a config document,
//! and reports either success, the list of schema violations, or the I/O
//! failure that prevented validation. Failures are data, not errors: one
//! broken document never aborts a batch.
//!
//! ## Example Usage
//!
//! ```rust
//! use cfglint_ir::ConfigDocument;
//! use cfglint_schema::{PlatformVersion, SchemaEntry, SchemaSource};
//! use cfglint_validation::{SchemaValidator, ValidationOutcome};
//!
//! let entry = SchemaEntry {
//!     version: PlatformVersion::new(33),
//!     source: SchemaSource::embedded(
//!         "config.xsd",
//!         br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!               <xs:element name="config" type="xs:string"/>
//!             </xs:schema>"#.to_vec(),
//!     ),
//! };
//! let document = ConfigDocument::in_memory("res/raw-v33/config.xml", "<config>on</config>");
//!
//! let validator = SchemaValidator::new();
//! assert_eq!(validator.validate(&entry, &document), ValidationOutcome::Valid);
//! ```

pub mod cache;
pub mod content;
pub mod engine;
pub mod instance;
pub mod rules;

// Re-export main types
pub use cache::SchemaCache;
pub use engine::{SchemaValidator, ValidationConfig, ValidationOutcome, Violation};
pub use rules::{check_builtin, check_value};

use cfglint_ir::ConfigDocument;
use cfglint_schema::SchemaEntry;

/// Convenience function to validate a document with default settings
#[must_use]
pub fn validate(entry: &SchemaEntry, document: &ConfigDocument) -> ValidationOutcome {
    SchemaValidator::new().validate(entry, document)
}
