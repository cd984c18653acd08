//! Structured compile diagnostics.
//!
//! Every lexer, parser and evaluator problem is recorded as a [`Diagnostic`]
//! instead of aborting compilation. A [`Diagnostics`] collector accumulates
//! them for one source and optionally forwards each entry to a listener as it
//! is recorded.
//!
//! ## Format
//!
//! The formatted form of a diagnostic is:
//!
//! ```text
//! <source-name>#<line>:<column>: <severity>: <message>
//! ```
//!
//! ```
//! use chimera::diagnostics::{Diagnostics, ErrorKind, Location};
//!
//! let mut diagnostics = Diagnostics::new("main.scss");
//! diagnostics.error(Location::new(12, 2, 5), ErrorKind::Syntax, "expected ':'");
//!
//! assert_eq!(diagnostics.entries()[0].formatted, "main.scss#2:5: error: expected ':'");
//! ```

use std::fmt;

/// A position inside a source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based and count
/// characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// How serious a diagnostic is.
///
/// Warnings are soft failures (one declaration dropped because of an
/// unresolved reference); errors are everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// The category of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unrecognized character, unterminated string or comment.
    Lex,
    /// Grammar violation; the parser resynchronized after it.
    Syntax,
    /// Unknown pseudo-class, unknown property, arity mismatch, bad value type,
    /// self-referential property read.
    Semantic,
    /// Unknown variable or function. Drops one declaration.
    UnresolvedReference,
    /// Unit-incompatible or type-incompatible arithmetic. Drops one declaration.
    IncompatibleOperand,
}

/// A single recorded problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub source_name: String,
    pub location: Location,
    pub severity: Severity,
    pub kind: ErrorKind,
    /// The raw message without location or severity.
    pub message: String,
    /// `"<source>#<line>:<column>: <severity>: <message>"`
    pub formatted: String,
}

impl Diagnostic {
    pub fn new(
        source_name: impl Into<String>,
        location: Location,
        severity: Severity,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let source_name = source_name.into();
        let message = message.into();
        let formatted = format!(
            "{}#{}:{}: {}: {}",
            source_name, location.line, location.column, severity, message
        );
        Self {
            source_name,
            location,
            severity,
            kind,
            message,
            formatted,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted)
    }
}

type Listener = Box<dyn FnMut(&Diagnostic) + Send>;

/// Collector for the diagnostics of one source text.
pub struct Diagnostics {
    source_name: String,
    entries: Vec<Diagnostic>,
    listener: Option<Listener>,
}

impl Diagnostics {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            entries: Vec::new(),
            listener: None,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn set_source_name(&mut self, name: impl Into<String>) {
        self.source_name = name.into();
    }

    /// Installs a callback invoked for every diagnostic as it is recorded.
    pub fn set_listener(&mut self, listener: impl FnMut(&Diagnostic) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn report(
        &mut self,
        location: Location,
        severity: Severity,
        kind: ErrorKind,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::new(&self.source_name, location, severity, kind, message);
        log::trace!("{}", diagnostic.formatted);
        if let Some(listener) = self.listener.as_mut() {
            listener(&diagnostic);
        }
        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, location: Location, kind: ErrorKind, message: impl Into<String>) {
        self.report(location, Severity::Error, kind, message);
    }

    pub fn warn(&mut self, location: Location, kind: ErrorKind, message: impl Into<String>) {
        self.report(location, Severity::Warning, kind, message);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("source_name", &self.source_name)
            .field("entries", &self.entries)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
