//! Recoverable problems found while extracting schemas.
//!
//! A [`Diagnostics`] sink is owned by the driver and lives for the whole run.
//! Each function gets a short-lived [`Reporter`] that tags everything it records
//! with the function's name. Recording a diagnostic never aborts the run, but
//! any recorded diagnostic makes the run as a whole unsuccessful.

use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Category of a recorded diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Missing or ambiguous import, enum case, or delegated method
    Resolution,
    /// Schema constructor called with unexpected arguments
    SchemaShape,
    /// Registry entry or service method could not be extracted
    Extraction,
    /// File header conventions (`@subpackage`, `@copyright`)
    Convention,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolution => "resolution",
            Self::SchemaShape => "schema shape",
            Self::Extraction => "extraction",
            Self::Convention => "convention",
        };
        f.write_str(name)
    }
}

/// One recorded soft failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Function being processed when the problem was found, if any
    pub function: Option<String>,

    pub message: String,

    /// Offending source text or other supporting detail
    pub context: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(f, "[{}] {}: {}", self.kind, function, self.message)?,
            None => write!(f, "[{}] {}", self.kind, self.message)?,
        }
        if let Some(context) = &self.context {
            for line in context.lines() {
                write!(f, "\n    | {line}")?;
            }
        }
        Ok(())
    }
}

/// Run-wide diagnostic sink
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic that is not tied to a single function
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        context: Option<String>,
    ) {
        self.push(Diagnostic {
            kind,
            function: None,
            message: message.into(),
            context,
        });
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        warn!(
            kind = %diagnostic.kind,
            function = diagnostic.function.as_deref().unwrap_or("-"),
            "{}",
            diagnostic.message
        );
        self.records.push(diagnostic);
    }

    /// Reporter that tags diagnostics with `function`
    pub fn reporter(&mut self, function: impl Into<String>) -> Reporter<'_> {
        Reporter {
            function: function.into(),
            sink: self,
        }
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the run should be reported as failed
    pub fn has_failures(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.records.iter().filter(|d| d.kind == kind).count()
    }

    pub fn for_function<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.records
            .iter()
            .filter(move |d| d.function.as_deref() == Some(function))
    }
}

/// Diagnostic handle scoped to one function
#[derive(Debug)]
pub struct Reporter<'a> {
    function: String,
    sink: &'a mut Diagnostics,
}

impl Reporter<'_> {
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(kind, message.into(), None);
    }

    pub fn report_with(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        context: impl Into<String>,
    ) {
        self.push(kind, message.into(), Some(context.into()));
    }

    fn push(&mut self, kind: DiagnosticKind, message: String, context: Option<String>) {
        self.sink.push(Diagnostic {
            kind,
            function: Some(self.function.clone()),
            message,
            context,
        });
    }
}
