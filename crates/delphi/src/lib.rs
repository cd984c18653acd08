//! # Delphi - Element Trees with Live Styles
//!
//! Delphi is a small arena-backed element tree that keeps a chimera
//! [`StyleSystem`](chimera::StyleSystem) in sync with every edit. It is the
//! host side of the [`DocumentTree`](chimera::dom::DocumentTree) boundary:
//! structure, attributes, class lists and hover/active state live here, and
//! each change is forwarded to the style system as it happens.
//!
//! ## Quick Start
//!
//! ```rust
//! use chimera::PropertyKey;
//! use chimera::types::Value;
//! use delphi::Document;
//!
//! let mut doc = Document::new("app");
//! let (_, diagnostics) = doc.load_stylesheet("app.scss", ".test { padding-left: 4px; }");
//! assert!(diagnostics.is_empty());
//!
//! let el = doc.create_element("item");
//! doc.append_child(doc.root(), el).unwrap();
//! doc.add_class(el, "test").unwrap();
//!
//! let style = doc.current_style(el).unwrap();
//! assert_eq!(style.get(PropertyKey::PaddingLeft), Some(&Value::px(4.0)));
//!
//! doc.remove_class(el, "test").unwrap();
//! let style = doc.current_style(el).unwrap();
//! assert_eq!(style.get(PropertyKey::PaddingLeft), None);
//! ```

mod document;
mod error;
mod tree;

pub use document::Document;
pub use error::DomError;
pub use tree::ElementTree;
