//! Integration tests for comments.
//!
//! Both `/* block */` and `// line` comments are accepted anywhere
//! whitespace is. A comment between two simple selectors acts as
//! whitespace, so it forms a descendant combinator.

use chimera::compiler::{CompileOptions, compile};
use chimera::diagnostics::ErrorKind;
use insta::assert_snapshot;

fn compile_clean(source: &str) -> String {
    let compilation = compile(source, &CompileOptions::new("comments.scss"));
    assert!(
        compilation.diagnostics.is_empty(),
        "{:?}",
        compilation.diagnostics.iter().map(|d| &d.formatted).collect::<Vec<_>>()
    );
    compilation.stylesheet.dump()
}

#[test]
fn test_block_comments() {
    let source = r#"
        /* header */
        a /* before brace */ {
            width: /* inside value */ 1px;
            /* between declarations */
            height: 2px /* before semicolon */;
        }
    "#;
    assert_snapshot!(compile_clean(source), @"a { width: 1px; height: 2px; }");
}

#[test]
fn test_line_comments() {
    let source = "// theme\na { // opening\n  width: 1px; // trailing\n  // height: 2px;\n}\n// end";
    assert_snapshot!(compile_clean(source), @"a { width: 1px; }");
}

#[test]
fn test_multiline_block_comment_keeps_line_numbers() {
    let source = "/*\n * several\n * lines\n */\na { paddi: 1px; }";
    let compilation = compile(source, &CompileOptions::new("comments.scss"));
    assert_snapshot!(
        compilation.diagnostics.entries()[0].formatted,
        @"comments.scss#5:5: error: unknown property 'paddi'"
    );
}

#[test]
fn test_comment_between_selectors_is_descendant() {
    assert_snapshot!(compile_clean("list/**/item { order: 1; }"), @"list item { order: 1; }");
    assert_snapshot!(compile_clean("list/**/>item { order: 1; }"), @"list > item { order: 1; }");
}

#[test]
fn test_unterminated_block_comment() {
    let compilation = compile("a { width: 1px; }\n/* never closed", &CompileOptions::new("comments.scss"));
    assert_eq!(compilation.diagnostics.len(), 1);
    assert_eq!(compilation.diagnostics.entries()[0].kind, ErrorKind::Lex);
    assert_eq!(compilation.stylesheet.dump(), "a { width: 1px; }");
}
