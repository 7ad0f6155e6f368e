#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfglint-checker
//!
//! Version-selected schema compliance checking for config documents.
//!
//! The [`ConfigComplianceChecker`] resolves the platform version a config
//! targets from its location, validates it against the newest schema
//! registered at or below that version, and probes every newer schema for
//! forward compatibility. Every outcome is returned as a [`Diagnostic`].
//!
//! ## Example Usage
//!
//! ```rust
//! use cfglint_checker::{ConfigComplianceChecker, DiagnosticKind};
//! use cfglint_ir::ConfigDocument;
//! use cfglint_schema::{SchemaRegistry, SchemaSource};
//! use std::sync::Arc;
//!
//! let xsd = br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!                 <xs:element name="config" type="xs:string"/>
//!               </xs:schema>"#;
//! let registry = SchemaRegistry::builder(33)
//!     .register(33, SchemaSource::embedded("v33", xsd.to_vec()))
//!     .build()
//!     .unwrap();
//! let checker = ConfigComplianceChecker::new(Arc::new(registry));
//!
//! let ok = ConfigDocument::in_memory("res/raw-v33/config.xml", "<config/>");
//! assert!(checker.check(&ok).is_empty());
//!
//! let old = ConfigDocument::in_memory("res/raw-v30/config.xml", "<config/>");
//! assert_eq!(checker.check(&old)[0].kind, DiagnosticKind::SchemaNotFound);
//! ```

pub mod checker;
pub mod diagnostic;
pub mod reporter;
pub mod resolver;

pub use checker::ConfigComplianceChecker;
pub use diagnostic::{Diagnostic, DiagnosticKind, ISSUE_ID, Location, Severity};
pub use reporter::{CheckReport, DiagnosticReporter, FileReport, ReportError, ReportFormat};
pub use resolver::{QualifierVersionResolver, ResolveError, VersionResolver};
