//! Integration tests for property values.
//!
//! Values are compiled through whole stylesheets so that variables,
//! functions and shorthand expansion are exercised together.

use chimera::compiler::{CompileOptions, Compilation, compile};
use chimera::diagnostics::{ErrorKind, Severity};
use chimera::properties::PropertyKey;
use chimera::types::{Color, Keyword, Value};
use insta::assert_snapshot;

fn compile_rule(body: &str) -> Compilation {
    compile(&format!("a {{ {} }}", body), &CompileOptions::new("values.scss"))
}

fn value_of(body: &str, key: PropertyKey) -> Option<Value> {
    let compilation = compile_rule(body);
    assert!(
        compilation.diagnostics.is_empty(),
        "{:?}",
        compilation.diagnostics.iter().map(|d| &d.formatted).collect::<Vec<_>>()
    );
    compilation
        .stylesheet
        .rules()
        .first()
        .and_then(|rule| rule.properties.get(key).cloned())
}

fn first_message(body: &str) -> String {
    compile_rule(body)
        .diagnostics
        .iter()
        .next()
        .map(|d| d.message.clone())
        .unwrap_or_default()
}

// ============================================================================
// LITERALS
// ============================================================================

#[test]
fn test_lengths_and_units() {
    assert_eq!(value_of("width: 10", PropertyKey::Width), Some(Value::number(10.0)));
    assert_eq!(value_of("width: 50%", PropertyKey::Width), Some(Value::percent(50.0)));
    assert_eq!(value_of("width: auto", PropertyKey::Width), Some(Value::Keyword(Keyword::Auto)));
    assert_eq!(
        value_of("max-width: none", PropertyKey::MaxWidth),
        Some(Value::Keyword(Keyword::None))
    );
    assert_eq!(value_of("font-size: 1.5px", PropertyKey::FontSize), Some(Value::px(1.5)));
}

#[test]
fn test_color_forms() {
    let red = Some(Value::Color(Color::rgb(255, 0, 0)));
    assert_eq!(value_of("color: #f00", PropertyKey::Color), red);
    assert_eq!(value_of("color: #FF0000", PropertyKey::Color), red);
    assert_eq!(value_of("color: red", PropertyKey::Color), red);
    assert_eq!(value_of("color: rgb(255, 0, 0)", PropertyKey::Color), red);
    assert_eq!(value_of("color: hsl(0, 100%, 50%)", PropertyKey::Color), red);
    assert_eq!(
        value_of("color: #ff000080", PropertyKey::Color),
        Some(Value::Color(Color::rgba(255, 0, 0, 128)))
    );
}

#[test]
fn test_invalid_hex_color() {
    let compilation = compile_rule("color: #12; width: 1px");
    assert_eq!(compilation.diagnostics.len(), 1);
    assert_eq!(compilation.diagnostics.entries()[0].kind, ErrorKind::Syntax);
    assert!(compilation.stylesheet.rules()[0].properties.contains(PropertyKey::Width));
}

#[test]
fn test_keywords_are_checked_per_property() {
    assert_eq!(
        value_of("display: flex; flex-direction: row-reverse", PropertyKey::FlexDirection),
        Some(Value::Keyword(Keyword::RowReverse))
    );
    assert_eq!(first_message("display: row"), "invalid value 'row' for property 'display'");
    assert_eq!(first_message("bold: yes"), "invalid value '\"yes\"' for property 'bold'");
}

// ============================================================================
// ARITHMETIC
// ============================================================================

#[test]
fn test_arithmetic_in_declarations() {
    assert_eq!(value_of("width: 2px * 3 + 1", PropertyKey::Width), Some(Value::px(7.0)));
    assert_eq!(value_of("width: (2 + 3) * 10%", PropertyKey::Width), Some(Value::percent(50.0)));
    assert_eq!(value_of("order: 12px / 4px", PropertyKey::Order), Some(Value::number(3.0)));
    assert_eq!(value_of("z-index: -3", PropertyKey::ZIndex), Some(Value::number(-3.0)));
}

#[test]
fn test_minus_separates_list_items_when_prefixed() {
    let compilation = compile_rule("margin: 4px -2px; padding: 4px - 2px");
    assert!(compilation.diagnostics.is_empty());
    assert_snapshot!(
        compilation.stylesheet.dump(),
        @"a { padding-top: 2px; padding-right: 2px; padding-bottom: 2px; padding-left: 2px; margin-top: 4px; margin-right: -2px; margin-bottom: 4px; margin-left: -2px; }"
    );
}

#[test]
fn test_arithmetic_errors() {
    let compilation = compile_rule("width: 1px + 1%");
    let diagnostic = &compilation.diagnostics.entries()[0];
    assert_eq!(diagnostic.kind, ErrorKind::IncompatibleOperand);
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "incompatible units: 1px + 1%");

    assert_eq!(first_message("width: 1px / 0"), "division by zero");
    assert_eq!(compile_rule("color: red * 2").diagnostics.entries()[0].kind, ErrorKind::IncompatibleOperand);
}

// ============================================================================
// VARIABLES
// ============================================================================

#[test]
fn test_list_variables_feed_shorthands() {
    let source = r#"
        $gap: 2px;
        $frame: $gap $gap * 2;
        a { padding: $frame; }
    "#;
    let compilation = compile(source, &CompileOptions::default());
    assert!(compilation.diagnostics.is_empty());
    assert_snapshot!(
        compilation.stylesheet.dump(),
        @"a { padding-top: 2px; padding-right: 4px; padding-bottom: 2px; padding-left: 4px; }"
    );
}

#[test]
fn test_sheet_variables_are_defined_before_rules() {
    let source = "a { width: $w; } $w: 1px; b { $w: 2px; width: $w; } $w: 3px;";
    let compilation = compile(source, &CompileOptions::default());
    assert!(compilation.diagnostics.is_empty());
    assert_snapshot!(compilation.stylesheet.dump(), @r"
    a { width: 3px; }
    b { width: 2px; }
    ");
}

#[test]
fn test_unknown_variable_location() {
    let compilation = compile(
        "a {\n  width: 1px;\n  height: $missing;\n}",
        &CompileOptions::new("values.scss"),
    );
    assert_snapshot!(
        compilation.diagnostics.entries()[0].formatted,
        @"values.scss#3:11: warning: unknown variable '$missing'"
    );
}

// ============================================================================
// FUNCTIONS
// ============================================================================

#[test]
fn test_math_functions() {
    assert_eq!(value_of("width: max(1px, 3px)", PropertyKey::Width), Some(Value::px(3.0)));
    assert_eq!(value_of("width: min(10%, 5)", PropertyKey::Width), Some(Value::percent(5.0)));
    assert_eq!(value_of("width: clamp(20px, 0px, 8px)", PropertyKey::Width), Some(Value::px(8.0)));
    assert_eq!(value_of("width: sqrt(16px)", PropertyKey::Width), Some(Value::px(4.0)));
    assert_eq!(value_of("order: abs(-2)", PropertyKey::Order), Some(Value::number(2.0)));
}

#[test]
fn test_color_functions() {
    let base = Color::rgb(128, 128, 128);
    let lighter = value_of("color: brighten(#808080, 20%)", PropertyKey::Color)
        .and_then(|v| v.as_color())
        .unwrap();
    assert!(lighter.to_hsl().2 > base.to_hsl().2);

    let darker = value_of("color: darken(#808080)", PropertyKey::Color)
        .and_then(|v| v.as_color())
        .unwrap();
    assert!(darker.to_hsl().2 < base.to_hsl().2);
}

#[test]
fn test_function_errors() {
    let compilation = compile_rule("width: nope(1)");
    assert_eq!(compilation.diagnostics.entries()[0].severity, Severity::Warning);
    assert_eq!(compilation.diagnostics.entries()[0].message, "unknown function 'nope'");

    assert_eq!(first_message("color: rgb(1, 2)"), "'rgb' expects 3 to 4 argument(s), found 2");
    assert_eq!(first_message("width: max(1px, 2px, 3px)"), "'max' expects 2 argument(s), found 3");
    let compilation = compile_rule("width: sqrt(-4px)");
    assert_eq!(compilation.diagnostics.entries()[0].kind, ErrorKind::Semantic);
}

#[test]
fn test_function_names_are_case_insensitive() {
    assert_eq!(
        value_of("color: RGB(0, 0, 255)", PropertyKey::Color),
        Some(Value::Color(Color::rgb(0, 0, 255)))
    );
}
