//! Error and debug reports accumulated across a translation.

use std::fmt::{self, Display};
use std::io::Write;
use std::path::Path;

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The translation continued.
    Warning,
    /// The affected unit produced no program.
    Error,
}

/// A single reported diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
}

impl Diagnostic {
    /// Severity of the diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Append-only collection of diagnostics for one translation unit.
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    /// Record a warning.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Whether any error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// All recorded diagnostics, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// A named section of the debug report.
#[derive(Debug, Clone)]
pub struct Section {
    id: String,
    title: String,
    body: String,
}

/// Accumulates named sections during a translation and is flushed to disk
/// once, at the end.
#[derive(Debug, Clone, Default)]
pub struct DebugReport {
    sections: Vec<Section>,
}

impl DebugReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section.
    pub fn add_section(
        &mut self,
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) {
        self.sections.push(Section {
            id: id.into(),
            title: title.into(),
            body: body.into(),
        });
    }

    /// Whether no section was recorded.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Look up a section body by id.
    pub fn section(&self, id: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|section| section.id == id)
            .map(|section| section.body.as_str())
    }

    /// Write the rendered report to `path`.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        write!(file, "{self}")
    }
}

impl Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "=== {} ({}) ===", section.title, section.id)?;
            writeln!(f, "{}", section.body)?;
        }
        Ok(())
    }
}
