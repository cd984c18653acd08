//! Error types for the chimera API surface.
//!
//! Stylesheet compilation never fails as a whole; its problems are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s. [`ChimeraError`] covers the
//! few calls that must either succeed or be refused outright, such as parsing
//! a standalone selector for an ad-hoc query.

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Errors returned by fallible chimera entry points.
///
/// # Examples
///
/// ```rust
/// use chimera::parse_selector;
///
/// // Unknown pseudo-classes are refused instead of silently never matching
/// let result = parse_selector("div:hovered");
/// assert!(result.is_err());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChimeraError {
    /// A selector string could not be parsed.
    ///
    /// Holds the first diagnostic produced for it.
    #[error("invalid selector: {0}")]
    InvalidSelector(Diagnostic),

    /// A property name is not part of the property catalog.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// A value does not fit the property's value kind.
    #[error("invalid value '{value}' for property '{property}'")]
    InvalidValue { property: String, value: String },
}
