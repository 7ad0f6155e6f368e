//! Version-selected schema compliance checking

use crate::diagnostic::Diagnostic;
use crate::resolver::{QualifierVersionResolver, VersionResolver};
use cfglint_ir::ConfigDocument;
use cfglint_schema::{PlatformVersion, SchemaCatalog};
use cfglint_validation::{SchemaValidator, ValidationOutcome};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Checks config documents against the schema for their platform version
/// and against every newer schema.
///
/// A config must comply with the schema registered at the highest version
/// that is lower than or equal to its own. Newer schemas are probed as well,
/// so that a schema change breaking existing configs is caught early.
pub struct ConfigComplianceChecker {
    catalog: Arc<dyn SchemaCatalog>,
    resolver: Box<dyn VersionResolver>,
    validator: SchemaValidator,
}

impl ConfigComplianceChecker {
    /// Create a checker with the default resolver and validator
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self {
            catalog,
            resolver: Box::new(QualifierVersionResolver),
            validator: SchemaValidator::new(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl VersionResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = validator;
        self
    }

    /// The catalog schemas are looked up in
    pub fn catalog(&self) -> &dyn SchemaCatalog {
        self.catalog.as_ref()
    }

    /// Check one config document.
    ///
    /// Diagnostics are returned in emission order: the primary validation
    /// (or the missing schema) first, then the probes of newer versions in
    /// ascending order.
    pub fn check(&self, document: &ConfigDocument) -> Vec<Diagnostic> {
        let path = document.location();
        let mut diagnostics = Vec::new();

        let version = match self.resolver.resolve(path) {
            Ok(version) => version,
            Err(e) => {
                debug!("Cannot resolve platform version of {:?}: {}", path, e);
                diagnostics.push(Diagnostic::version_unresolvable(path, e));
                return diagnostics;
            }
        };
        trace!("Checking {:?} at platform version {}", path, version);

        let floor = self.catalog.min_supported_version();
        let ceiling = self.catalog.max_registered_version();

        // Nothing is registered above the ceiling
        let start = version.min(ceiling);
        let found = (floor.get()..=start.get())
            .rev()
            .map(PlatformVersion::new)
            .any(|candidate| self.test_schema(candidate, document, &mut diagnostics));

        if !found {
            info!("No schema at or below platform version {} for {:?}", version, path);
            diagnostics.push(Diagnostic::schema_not_found(path, version));
        }

        if let Some(next) = version.next() {
            for candidate in (next.get()..=ceiling.get()).map(PlatformVersion::new) {
                self.test_schema(candidate, document, &mut diagnostics);
            }
        }

        diagnostics
    }

    /// Validate against the schema of exactly `version`, if there is one.
    ///
    /// Returns whether a schema was registered.
    fn test_schema(
        &self,
        version: PlatformVersion,
        document: &ConfigDocument,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let Some(entry) = self.catalog.schema_for(version) else {
            return false;
        };

        let path: &Path = document.location();
        match self.validator.validate(&entry, document) {
            ValidationOutcome::Valid => {
                debug!("{:?} is valid at version {}", path, version);
            }
            ValidationOutcome::Invalid(violations) => {
                debug!(
                    "{:?} has {} violation(s) at version {}",
                    path,
                    violations.len(),
                    version
                );
                diagnostics.extend(violations.iter().map(|violation| {
                    Diagnostic::structural_violation(path, version, violation)
                }));
            }
            ValidationOutcome::IoFailure(reason) => {
                diagnostics.push(Diagnostic::io_failure(path, version, &reason));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use cfglint_schema::{SchemaRegistry, SchemaSource};

    const XSD: &[u8] = br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="config" type="xs:string"/>
</xs:schema>"#;

    fn checker(versions: &[u32], floor: u32) -> ConfigComplianceChecker {
        let registry = versions
            .iter()
            .fold(SchemaRegistry::builder(floor), |builder, v| {
                builder.register(*v, SchemaSource::embedded(format!("v{v}"), XSD.to_vec()))
            })
            .build()
            .unwrap();
        ConfigComplianceChecker::new(Arc::new(registry))
    }

    #[test]
    fn test_valid_config_has_no_diagnostics() {
        let checker = checker(&[33, 34], 33);
        let doc = ConfigDocument::in_memory("res/raw-v33/c.xml", "<config/>");
        assert!(checker.check(&doc).is_empty());
    }

    #[test]
    fn test_tag_below_floor_reports_not_found() {
        let checker = checker(&[33], 33);
        let doc = ConfigDocument::in_memory("res/raw-v30/c.xml", "<config/>");

        let diagnostics = checker.check(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::SchemaNotFound);
        assert_eq!(diagnostics[0].version, Some(PlatformVersion::new(30)));
    }

    #[test]
    fn test_unresolvable_version_is_fatal() {
        let checker = checker(&[33], 33);
        let doc = ConfigDocument::in_memory("res/raw/c.xml", "<config/>");

        let diagnostics = checker.check(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::VersionUnresolvable);
        assert_eq!(diagnostics[0].severity, crate::diagnostic::Severity::Fatal);
        assert!(diagnostics[0].version.is_none());
    }

    #[test]
    fn test_invalid_config_reports_each_violation() {
        let checker = checker(&[33], 33);
        let doc = ConfigDocument::in_memory("res/raw-v33/c.xml", "<settings/>");

        let diagnostics = checker.check(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::StructuralViolation);
        assert_eq!(
            diagnostics[0].message,
            "Schema violation at version=33: \"lineNumber: 1; columnNumber: 1; cvc-elt.1.a: Cannot find the declaration of element 'settings'.\""
        );
    }
}
