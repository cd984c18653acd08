//! Live stylesheets for element trees.
//!
//! Re-exports [`chimera`], the stylesheet compiler and style engine, and
//! [`delphi`], the element tree that keeps a chimera style system in sync.

pub use chimera;
pub use delphi;

pub use chimera::{
    ChimeraError, CompileOptions, NodeState, Origin, PropertyKey, PropertySet, Selector,
    StyleSystem, Stylesheet, compile, parse_selector,
};
pub use delphi::{Document, DomError};
