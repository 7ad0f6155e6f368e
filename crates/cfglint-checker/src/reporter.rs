//! Rendering of check results

use crate::diagnostic::Diagnostic;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One line per diagnostic followed by a summary
    #[default]
    Text,
    Json,
}

/// Diagnostics of one checked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Results of checking a set of files
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub generated_at: DateTime<Utc>,
    pub files: Vec<FileReport>,
    pub total_diagnostics: usize,
}

impl CheckReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        let total_diagnostics = files.iter().map(|f| f.diagnostics.len()).sum();
        Self {
            generated_at: Utc::now(),
            files,
            total_diagnostics,
        }
    }

    #[must_use]
    pub fn has_diagnostics(&self) -> bool {
        self.total_diagnostics > 0
    }
}

/// Writes check reports
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticReporter {
    format: ReportFormat,
}

impl DiagnosticReporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Write `report` to `out` in the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error when writing or serialization fails.
    pub fn write<W: Write>(&self, report: &CheckReport, out: &mut W) -> Result<(), ReportError> {
        match self.format {
            ReportFormat::Text => {
                for diagnostic in report.files.iter().flat_map(|f| &f.diagnostics) {
                    writeln!(out, "{diagnostic}")?;
                }
                writeln!(
                    out,
                    "Checked {} file(s), {} diagnostic(s).",
                    report.files.len(),
                    report.total_diagnostics
                )?;
            }
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, report)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// Render `report` into a string
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn render(&self, report: &CheckReport) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write(report, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfglint_schema::PlatformVersion;
    use std::path::Path;

    fn report() -> CheckReport {
        let path = Path::new("res/raw-v30/safety_center_config.xml");
        CheckReport::new(vec![
            FileReport {
                path: path.to_path_buf(),
                diagnostics: vec![Diagnostic::schema_not_found(path, PlatformVersion::new(30))],
            },
            FileReport {
                path: PathBuf::from("res/raw-v34/safety_center_config.xml"),
                diagnostics: Vec::new(),
            },
        ])
    }

    #[test]
    fn test_text_report() {
        let text = DiagnosticReporter::new(ReportFormat::Text)
            .render(&report())
            .unwrap();

        assert_eq!(
            text,
            "res/raw-v30/safety_center_config.xml: error: [InvalidConfigSchema] No schema found for platform version: 30, was it deleted?\n\
             Checked 2 file(s), 1 diagnostic(s).\n"
        );
    }

    #[test]
    fn test_json_report() {
        let json = DiagnosticReporter::new(ReportFormat::Json)
            .render(&report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_diagnostics"], 1);
        assert_eq!(value["files"].as_array().unwrap().len(), 2);
        assert_eq!(value["files"][0]["diagnostics"][0]["kind"], "schema_not_found");
        assert_eq!(value["files"][0]["diagnostics"][0]["version"], 30);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_empty_report() {
        let report = CheckReport::new(Vec::new());
        assert!(!report.has_diagnostics());
        assert_eq!(
            DiagnosticReporter::default().render(&report).unwrap(),
            "Checked 0 file(s), 0 diagnostic(s).\n"
        );
    }
}
