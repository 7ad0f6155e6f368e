//! Schema validation engine

use crate::cache::SchemaCache;
use crate::instance::InstanceValidator;
use cfglint_ir::{ConfigDocument, Position};
use cfglint_schema::{Schema, SchemaEntry, SchemaLoader};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Maximum violations collected per document (0 = unlimited)
    pub max_violations: usize,
    /// Reuse compiled schemas across validations
    pub cache_schemas: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_violations: 0,
            cache_schemas: true,
        }
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    /// Position in the document, or in the schema for compile errors
    pub position: Option<Position>,
}

impl Violation {
    /// A violation without a known position
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(position: Position, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "lineNumber: {}; columnNumber: {}; {}",
                pos.line, pos.column, self.message
            ),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of validating one document against one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    /// The document (or the schema) is not valid
    Invalid(Vec<Violation>),
    /// The document or schema could not be read
    IoFailure(String),
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Validates config documents against registry schemas.
///
/// Every call reads the document afresh. Compiled schemas are cached per
/// registry entry unless caching is disabled, so sharing one validator
/// between threads compiles each schema once.
#[derive(Debug, Default)]
pub struct SchemaValidator {
    config: ValidationConfig,
    loader: SchemaLoader,
    cache: SchemaCache,
}

impl SchemaValidator {
    /// Create a validator with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specific configuration
    #[must_use]
    pub fn with_config(config: ValidationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `document` against the schema of `entry`
    pub fn validate(&self, entry: &SchemaEntry, document: &ConfigDocument) -> ValidationOutcome {
        let schema = match self.compiled_schema(entry) {
            Ok(schema) => schema,
            Err(outcome) => return outcome,
        };

        trace!(
            "Validating {:?} against schema for version {}",
            document.location(),
            entry.version
        );
        let parsed = match document.load() {
            Ok(parsed) => parsed,
            Err(cfglint_ir::Error::Io(e)) => return ValidationOutcome::IoFailure(e.to_string()),
            Err(e) => {
                let violation = Violation {
                    message: e.to_string(),
                    position: e.position(),
                };
                return ValidationOutcome::Invalid(vec![violation]);
            }
        };

        let violations =
            InstanceValidator::new(&schema, self.config.max_violations).validate(&parsed);
        if violations.is_empty() {
            ValidationOutcome::Valid
        } else {
            debug!(
                "{:?} has {} violation(s) against version {}",
                document.location(),
                violations.len(),
                entry.version
            );
            ValidationOutcome::Invalid(violations)
        }
    }

    fn compiled_schema(&self, entry: &SchemaEntry) -> Result<Arc<Schema>, ValidationOutcome> {
        if self.config.cache_schemas {
            if let Some(schema) = self.cache.get(entry) {
                debug!("Cache hit for schema: {}", entry.source);
                return Ok(schema);
            }
            trace!("Cache miss for schema: {}", entry.source);
        }

        match self.loader.load_from_source(&entry.source) {
            Ok(schema) => {
                let schema = Arc::new(schema);
                if self.config.cache_schemas {
                    self.cache.insert(entry.clone(), Arc::clone(&schema));
                }
                Ok(schema)
            }
            Err(cfglint_schema::Error::Io(e)) => Err(ValidationOutcome::IoFailure(e.to_string())),
            Err(e) => Err(ValidationOutcome::Invalid(vec![Violation::new(e.to_string())])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfglint_schema::{PlatformVersion, SchemaSource};

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="config">
    <xs:complexType>
      <xs:attribute name="enabled" type="xs:boolean" use="required"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn entry(xsd: &str) -> SchemaEntry {
        SchemaEntry {
            version: PlatformVersion::new(33),
            source: SchemaSource::embedded("config.xsd", xsd.as_bytes().to_vec()),
        }
    }

    #[test]
    fn test_valid_document() {
        let validator = SchemaValidator::new();
        let doc = ConfigDocument::in_memory("res/raw/config.xml", r#"<config enabled="true"/>"#);
        assert_eq!(validator.validate(&entry(XSD), &doc), ValidationOutcome::Valid);
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::at(
            Position::new(3, 7),
            "cvc-elt.1.a: Cannot find the declaration of element 'x'.",
        );
        assert_eq!(
            violation.to_string(),
            "lineNumber: 3; columnNumber: 7; cvc-elt.1.a: Cannot find the declaration of element 'x'."
        );
        assert_eq!(Violation::new("bad").to_string(), "bad");
    }

    #[test]
    fn test_malformed_document_is_invalid() {
        let validator = SchemaValidator::new();
        let doc = ConfigDocument::in_memory("res/raw/config.xml", "<config enabled=\"true\">");

        match validator.validate(&entry(XSD), &doc) {
            ValidationOutcome::Invalid(violations) => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].position.is_some());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_document_is_io_failure() {
        let validator = SchemaValidator::new();
        let doc = ConfigDocument::on_disk("/nonexistent/res/raw-v33/config.xml");
        assert!(matches!(
            validator.validate(&entry(XSD), &doc),
            ValidationOutcome::IoFailure(_)
        ));
    }

    #[test]
    fn test_missing_schema_file_is_io_failure() {
        let validator = SchemaValidator::new();
        let entry = SchemaEntry {
            version: PlatformVersion::new(33),
            source: SchemaSource::file("/nonexistent/config_v33.xsd"),
        };
        let doc = ConfigDocument::in_memory("config.xml", "<config enabled=\"true\"/>");
        assert!(matches!(
            validator.validate(&entry, &doc),
            ValidationOutcome::IoFailure(_)
        ));
    }

    #[test]
    fn test_uncompilable_schema_is_invalid() {
        let validator = SchemaValidator::new();
        let doc = ConfigDocument::in_memory("config.xml", "<config/>");
        let outcome = validator.validate(&entry("<xs:schema"), &doc);
        assert!(matches!(outcome, ValidationOutcome::Invalid(v) if v.len() == 1));
    }

    #[test]
    fn test_schemas_are_compiled_once() {
        let validator = SchemaValidator::new();
        let doc = ConfigDocument::in_memory("config.xml", r#"<config enabled="1"/>"#);

        assert!(validator.validate(&entry(XSD), &doc).is_valid());
        assert!(validator.validate(&entry(XSD), &doc).is_valid());
        assert_eq!(validator.cache.len(), 1);
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let validator = SchemaValidator::with_config(ValidationConfig {
            cache_schemas: false,
            ..ValidationConfig::default()
        });
        let doc = ConfigDocument::in_memory("config.xml", r#"<config enabled="1"/>"#);

        assert!(validator.validate(&entry(XSD), &doc).is_valid());
        assert!(validator.cache.is_empty());
    }
}
