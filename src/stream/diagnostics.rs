use crate::Error;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// An expected default was applied.
    Info,
    /// A directive or field was dropped.
    Warn,
    /// The parser was driven in a way it does not support.
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

/// A note about something the parser had to default, drop or reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// 1-based input line, when the diagnostic came from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Machine-readable code of the underlying error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            line: None,
            code: None,
        }
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_error(mut self, error: &Error) -> Self {
        self.code = Some(error.error_code());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.level, line, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

type Callback = Box<dyn FnMut(&Diagnostic) + Send>;

/// Collects diagnostics, forwards them to an optional observer and mirrors
/// them to `tracing`.
#[derive(Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    callback: Option<Callback>,
    line: Option<usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_diagnostic(&mut self, callback: impl FnMut(&Diagnostic) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Line that subsequent diagnostics are attributed to.
    pub fn set_line(&mut self, line: Option<usize>) {
        self.line = line;
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.emit(Diagnostic::new(DiagnosticLevel::Info, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.emit(Diagnostic::new(DiagnosticLevel::Warn, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.emit(Diagnostic::new(DiagnosticLevel::Error, message));
    }

    /// Warn about a field dropped because it failed to parse.
    pub fn warn_invalid(&mut self, message: impl Into<String>, error: &Error) {
        self.emit(Diagnostic::new(DiagnosticLevel::Warn, message).with_error(error));
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        let diagnostic = diagnostic.with_line(self.line);

        match diagnostic.level {
            DiagnosticLevel::Info => tracing::info!(line = ?diagnostic.line, "{}", diagnostic.message),
            DiagnosticLevel::Warn => tracing::warn!(line = ?diagnostic.line, "{}", diagnostic.message),
            DiagnosticLevel::Error => {
                tracing::error!(line = ?diagnostic.line, "{}", diagnostic.message)
            }
        }

        if let Some(callback) = self.callback.as_mut() {
            callback(&diagnostic);
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    /// Entries at `level`.
    pub fn at_level(&self, level: DiagnosticLevel) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.level == level)
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("entries", &self.entries)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
