//! Integration tests for styles on a live document.
//!
//! These drive a [`Document`] the way a host would: load sheets, build the
//! tree, set classes and inline styles, then read back the current style.

use chimera::PropertyKey;
use chimera::diagnostics::{ErrorKind, Severity};
use chimera::types::{Color, Keyword, Value};
use delphi::Document;
use insta::assert_snapshot;

fn document_with(source: &str) -> Document {
    let mut doc = Document::new("app");
    let (_, diagnostics) = doc.load_stylesheet("test.scss", source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.iter().map(|d| &d.formatted).collect::<Vec<_>>());
    doc
}

// ============================================================================
// STYLESHEET RULES
// ============================================================================

#[test]
fn test_class_rule_applies_and_unapplies() {
    let mut doc = document_with(".test { padding-left: 4px; }");
    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    doc.set_class_name(el, "test").unwrap();

    let style = doc.current_style(el).unwrap();
    assert_eq!(style.get(PropertyKey::PaddingLeft), Some(&Value::px(4.0)));

    doc.set_class_name(el, "").unwrap();
    let style = doc.current_style(el).unwrap();
    assert_eq!(style.get(PropertyKey::PaddingLeft), None);
    assert_eq!(style.computed(PropertyKey::PaddingLeft), Value::px(0.0));
}

#[test]
fn test_engine_defaults_apply_below_user_rules() {
    let mut doc = document_with("button.primary { background-color: #3080ff; }");
    let button = doc.create_element("button");
    doc.append_child(doc.root(), button).unwrap();

    let style = doc.current_style(button).unwrap();
    assert_eq!(style.get(PropertyKey::Display), Some(&Value::Keyword(Keyword::InlineBlock)));
    assert_eq!(
        style.get(PropertyKey::BackgroundColor),
        Some(&Value::Color(Color::rgb(0x33, 0x33, 0x33)))
    );

    doc.add_class(button, "primary").unwrap();
    let style = doc.current_style(button).unwrap();
    assert_eq!(
        style.get(PropertyKey::BackgroundColor),
        Some(&Value::Color(Color::rgb(0x30, 0x80, 0xff)))
    );
    assert_eq!(style.get(PropertyKey::Display), Some(&Value::Keyword(Keyword::InlineBlock)));
}

#[test]
fn test_disabled_button_defaults() {
    let mut doc = Document::new("app");
    let button = doc.create_element("button");
    doc.append_child(doc.root(), button).unwrap();
    doc.set_attribute(button, "enabled", "false").unwrap();

    let style = doc.current_style(button).unwrap();
    assert_eq!(
        style.get(PropertyKey::Color),
        Some(&Value::Color(Color::rgb(0xa0, 0xa0, 0xa0)))
    );
}

#[test]
fn test_removing_a_stylesheet() {
    let mut doc = Document::new("app");
    let (generation, _) = doc.load_stylesheet("a.scss", "item { order: 2; }");
    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    assert_eq!(doc.current_style(el).unwrap().get(PropertyKey::Order), Some(&Value::number(2.0)));

    assert!(doc.remove_stylesheet(generation).is_some());
    assert!(doc.remove_stylesheet(generation).is_none());
    assert_eq!(doc.current_style(el).unwrap().get(PropertyKey::Order), None);
}

#[test]
fn test_stylesheet_with_errors_still_attaches() {
    let mut doc = Document::new("app");
    let (_, diagnostics) = doc.load_stylesheet(
        "broken.scss",
        ".test {\n  padding-left: 4px;\n  paddi: 4px;\n}",
    );
    assert_eq!(diagnostics.len(), 1);
    assert_snapshot!(
        diagnostics.entries()[0].formatted,
        @"broken.scss#3:3: error: unknown property 'paddi'"
    );

    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    doc.add_class(el, "test").unwrap();
    assert_eq!(
        doc.current_style(el).unwrap().get(PropertyKey::PaddingLeft),
        Some(&Value::px(4.0))
    );
}

// ============================================================================
// INLINE STYLES
// ============================================================================

#[test]
fn test_inline_style() {
    let mut doc = Document::new("app");
    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    doc.set_style(el, "padding-left: 4px;").unwrap();

    assert_eq!(
        doc.inline_style(el).unwrap().get(PropertyKey::PaddingLeft),
        Some(&Value::px(4.0))
    );
    assert_eq!(
        doc.current_style(el).unwrap().get(PropertyKey::PaddingLeft),
        Some(&Value::px(4.0))
    );
    assert!(!doc.cascaded_style(el).unwrap().contains(PropertyKey::PaddingLeft));
    assert!(doc.take_diagnostics().is_empty());
}

#[test]
fn test_inline_unknown_property_does_not_panic() {
    let mut doc = Document::new("app");
    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    doc.set_style(el, "paddi: 4px;").unwrap();

    assert!(doc.inline_style(el).unwrap().is_empty());
    let diagnostics = doc.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, ErrorKind::Semantic);
    assert_snapshot!(diagnostics[0].formatted, @"item[style]#1:1: error: unknown property 'paddi'");
}

#[test]
fn test_inline_unknown_variable_does_not_panic() {
    let mut doc = Document::new("app");
    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    doc.set_style(el, "padding-left: $non-existent-variable; margin-top: 1px").unwrap();

    let inline = doc.inline_style(el).unwrap();
    assert!(!inline.contains(PropertyKey::PaddingLeft));
    assert!(inline.contains(PropertyKey::MarginTop));

    let diagnostics = doc.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_inline_overrides_every_rule() {
    let mut doc = document_with(
        "#hero.big item:first-child { padding-left: 9px !important; }",
    );
    let hero = doc.create_element("div");
    doc.append_child(doc.root(), hero).unwrap();
    doc.set_attribute(hero, "id", "hero").unwrap();
    doc.add_class(hero, "big").unwrap();
    let el = doc.create_element("item");
    doc.append_child(hero, el).unwrap();

    assert_eq!(doc.current_style(el).unwrap().get(PropertyKey::PaddingLeft), Some(&Value::px(9.0)));

    doc.set_style(el, "padding-left:4px").unwrap();
    assert_eq!(doc.current_style(el).unwrap().get(PropertyKey::PaddingLeft), Some(&Value::px(4.0)));
    assert_eq!(doc.cascaded_style(el).unwrap().get(PropertyKey::PaddingLeft), Some(&Value::px(9.0)));
}

#[test]
fn test_inline_is_recompiled_only_when_text_changes() {
    let mut doc = Document::new("app");
    let el = doc.create_element("item");
    doc.append_child(doc.root(), el).unwrap();
    doc.set_style(el, "paddi: 1px").unwrap();
    doc.current_style(el).unwrap();
    assert_eq!(doc.take_diagnostics().len(), 1);

    // A class change dirties the node but leaves the style text alone
    doc.add_class(el, "x").unwrap();
    doc.current_style(el).unwrap();
    assert!(doc.take_diagnostics().is_empty());

    doc.set_style(el, "paddi: 2px").unwrap();
    doc.current_style(el).unwrap();
    assert_eq!(doc.take_diagnostics().len(), 1);
}
