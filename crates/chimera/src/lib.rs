//! # Chimera - SCSS-like Stylesheets for Element Trees
//!
//! Chimera compiles a small SCSS dialect into immutable stylesheets and keeps
//! the cascaded style of every element of a live document up to date.
//!
//! - **Compilation**: text is lexed, parsed and evaluated into a
//!   [`Stylesheet`](stylesheet::Stylesheet); problems become
//!   [`Diagnostic`](diagnostics::Diagnostic)s instead of failures
//! - **Selectors**: combinators, attribute selectors and structural or state
//!   pseudo-classes with CSS specificity
//! - **Cascade**: [`StyleSystem`](cascade::StyleSystem) resolves styles lazily
//!   per element and invalidates them on document mutation
//!
//! ## Quick Start
//!
//! ```rust
//! use chimera::compiler::{compile, CompileOptions};
//!
//! let source = r#"
//!     $accent: #3080ff;
//!
//!     button {
//!         padding: 1px 2px;
//!         background-color: $accent;
//!
//!         &:hover {
//!             background-color: brighten($accent, 10%);
//!         }
//!     }
//! "#;
//!
//! let compilation = compile(source, &CompileOptions::new("theme.scss"));
//! assert!(compilation.diagnostics.is_empty());
//! assert_eq!(compilation.stylesheet.len(), 2);
//! ```
//!
//! ## Supported Features
//!
//! ### Selectors
//! - Type, class, id and universal selectors: `button`, `.primary`, `#submit`, `*`
//! - Attributes: `[name]`, `[name=value]`, `~=`, `|=`, `^=`, `$=`, `*=`
//! - Combinators: descendant, `>`, `+`, `~`
//! - Pseudo-classes: `:hover`, `:active`, `:root`, `:enabled`, `:disabled`,
//!   `:first-child`, `:last-child`, `:only-child` and the `-of-type` forms
//! - Pseudo-functions: `:nth-child(an+b [of S])`, `:nth-last-child`,
//!   `:nth-of-type`, `:nth-last-of-type`, `:not(S)`, `:is(S)`
//!
//! ### Values
//! - Numbers with units: `px`, `%`, `ch`, `cm`, `vw`, `vh`, `deg`, `rad`
//! - Colors: `#rgb`, `#rrggbbaa`, named colors, `rgb()`, `hsl()`
//! - Arithmetic: `$gap * 2`, `100% - 4px` is an error (incompatible units)
//! - Variables with block scoping and nested rules with `&`
//!
//! ## Modules
//!
//! - [`lexer`] and [`parser`]: text to [`ast`]
//! - [`eval`]: expressions to [`types::Value`]s
//! - [`compiler`]: ASTs to [`stylesheet::Stylesheet`]s
//! - [`selector`]: selector AST, specificity and matching
//! - [`cascade`]: the per-document Style Object Model
//! - [`dom`]: the document boundary the engine reads from

pub mod ast;
pub mod cascade;
pub mod compiler;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod properties;
pub mod selector;
pub mod stylesheet;
pub mod types;

pub use cascade::{NodeState, StyleSystem};
pub use compiler::{CompileOptions, compile};
pub use error::ChimeraError;
pub use properties::{PropertyKey, PropertySet};
pub use selector::Selector;
pub use stylesheet::{Origin, Stylesheet};

use diagnostics::{Diagnostic, Severity};

/// Parses standalone selector text, such as the argument of an ad-hoc
/// `matches` query. `&` is not allowed.
///
/// ```rust
/// let selector = chimera::parse_selector("list > item:nth-child(2n+1)").unwrap();
/// assert_eq!(selector.to_string(), "list > item:nth-child(2n+1)");
/// assert_eq!(selector.specificity().to_string(), "(0,1,2)");
/// ```
pub fn parse_selector(text: &str) -> Result<Selector, ChimeraError> {
    const SOURCE_NAME: &str = "selector";

    let mut parser = parser::Parser::new(text, SOURCE_NAME);
    let result = parser.selector();
    if let Some(first) = parser.into_diagnostics().into_vec().into_iter().next() {
        return Err(ChimeraError::InvalidSelector(first));
    }
    result.map_err(|error| {
        ChimeraError::InvalidSelector(Diagnostic::new(
            SOURCE_NAME,
            error.location,
            Severity::Error,
            error.kind,
            error.message,
        ))
    })
}
