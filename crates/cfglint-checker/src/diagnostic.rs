//! Diagnostics produced by the compliance checker

use cfglint_schema::PlatformVersion;
use cfglint_validation::Violation;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier every diagnostic is reported under
pub const ISSUE_ID: &str = "InvalidConfigSchema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    /// The config could not be checked at all
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    VersionUnresolvable,
    SchemaNotFound,
    StructuralViolation,
    SchemaIoFailure,
}

/// Where in the config a diagnostic applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl Location {
    /// The whole file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        Ok(())
    }
}

/// A single finding about a config document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Schema version the finding belongs to; absent when none could be chosen
    pub version: Option<PlatformVersion>,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn version_unresolvable(path: &Path, reason: impl fmt::Display) -> Self {
        Self {
            version: None,
            severity: Severity::Fatal,
            kind: DiagnosticKind::VersionUnresolvable,
            message: format!("Unable to determine platform version: {reason}"),
            location: Location::file(path),
        }
    }

    pub fn schema_not_found(path: &Path, version: PlatformVersion) -> Self {
        Self {
            version: Some(version),
            severity: Severity::Error,
            kind: DiagnosticKind::SchemaNotFound,
            message: format!("No schema found for platform version: {version}, was it deleted?"),
            location: Location::file(path),
        }
    }

    pub fn structural_violation(
        path: &Path,
        version: PlatformVersion,
        violation: &Violation,
    ) -> Self {
        Self {
            version: Some(version),
            severity: Severity::Error,
            kind: DiagnosticKind::StructuralViolation,
            message: format!("Schema violation at version={version}: \"{violation}\""),
            location: Location {
                path: path.to_path_buf(),
                line: violation.position.map(|p| p.line),
                column: violation.position.map(|p| p.column),
            },
        }
    }

    pub fn io_failure(path: &Path, version: PlatformVersion, reason: &str) -> Self {
        Self {
            version: Some(version),
            severity: Severity::Error,
            kind: DiagnosticKind::SchemaIoFailure,
            message: format!("I/O failure at version={version}: \"{reason}\""),
            location: Location::file(path),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: [{}] {}",
            self.location, self.severity, ISSUE_ID, self.message
        )
    }
}
