//! Recursive-descent parser for stylesheets, inline styles and selectors.
//!
//! The parser works over the token stream of a [`Lexer`] and never aborts:
//! each problem becomes a [`Diagnostic`](crate::diagnostics::Diagnostic) and
//! the parser resynchronizes at the next statement boundary (`;` or the end
//! of the offending `{...}` block), so one malformed declaration costs only
//! that declaration.
//!
//! ## Grammar
//!
//! ```text
//! sheet          := (variable-decl | rule)*
//! rule           := selector-group '{' (variable-decl | property-decl | rule)* '}'
//! property-decl  := ident ':' value ('!' 'important')? ';'
//! variable-decl  := '$' ident ':' value ';'
//! value          := expr+
//! expr           := term (('+' | '-' | '*' | '/') term)*
//! term           := number | string | '#' hex | ident | '$' ident
//!                 | ident '(' (expr (',' expr)*)? ')' | '(' expr ')' | '-' term
//! ```
//!
//! A body item is a nested rule when a `{` comes before the next `;` or `}`.
//!
//! ## Example
//!
//! ```rust
//! use chimera::parser::Parser;
//!
//! let mut parser = Parser::new(".a { padding-left: 4px; }", "example.scss");
//! let sheet = parser.stylesheet();
//!
//! assert_eq!(sheet.rules.len(), 1);
//! assert!(parser.diagnostics().is_empty());
//! ```

mod selectors;

use thiserror::Error;

use crate::ast::{
    BinaryOp, ExprKind, Expression, InlineStyleStatement, PropertyDecl, RuleStatement,
    SheetStatement, Statement, VariableDecl,
};
use crate::diagnostics::{Diagnostics, ErrorKind, Location};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::types::Color;

/// A located parse failure. Reported as a diagnostic by the parser itself.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct SyntaxError {
    pub location: Location,
    pub kind: ErrorKind,
    pub message: String,
}

impl SyntaxError {
    pub fn syntax(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            kind: ErrorKind::Syntax,
            message: message.into(),
        }
    }

    pub fn semantic(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            kind: ErrorKind::Semantic,
            message: message.into(),
        }
    }
}

type ParseResult<T> = Result<T, SyntaxError>;

pub struct Parser<'a> {
    source: &'a str,
    /// Never empty; the last token is always `Eof`.
    tokens: Vec<Token<'a>>,
    pos: usize,
    diagnostics: Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, source_name: impl Into<String>) -> Self {
        Self::with_diagnostics(source, Diagnostics::new(source_name))
    }

    /// Parses into an existing collector, keeping its listener.
    pub fn with_diagnostics(source: &'a str, mut diagnostics: Diagnostics) -> Self {
        let mut tokens = Vec::new();
        for token in Lexer::new(source) {
            match token.kind {
                TokenKind::Error(problem) => {
                    diagnostics.error(token.location, ErrorKind::Lex, problem.message())
                }
                _ => tokens.push(token),
            }
        }
        Self {
            source,
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Parses a whole stylesheet.
    pub fn stylesheet(&mut self) -> SheetStatement {
        let mut sheet = SheetStatement::default();
        while !self.at(TokenKind::Eof) {
            let start = self.pos;
            match self.peek_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::RBrace => {
                    let error = self.unexpected("a rule");
                    self.report(error);
                    self.advance();
                }
                TokenKind::Dollar => match self.variable_decl() {
                    Ok(variable) => sheet.variables.push(variable),
                    Err(error) => self.fail(error),
                },
                _ => match self.rule(false) {
                    Ok(rule) => sheet.rules.push(rule),
                    Err(error) => self.fail(error),
                },
            }
            if self.pos == start && !self.at(TokenKind::Eof) {
                self.advance();
            }
        }
        sheet
    }

    /// Parses the declarations of a `style` attribute.
    pub fn inline_style(&mut self) -> InlineStyleStatement {
        let mut inline = InlineStyleStatement::default();
        while !self.at(TokenKind::Eof) {
            let start = self.pos;
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            match self.property_decl() {
                Ok(property) => inline.properties.push(property),
                Err(error) => self.fail(error),
            }
            if self.pos == start && !self.at(TokenKind::Eof) {
                self.advance();
            }
        }
        inline
    }

    /// Parses a standalone selector group. `&` is not allowed.
    pub fn selector(&mut self) -> ParseResult<crate::selector::Selector> {
        let selector = self.selector_group(false)?;
        if !self.at(TokenKind::Eof) {
            return Err(self.unexpected("',' or end of selector"));
        }
        Ok(selector)
    }

    /// Parses a standalone property value. Failures yield an erroneous node.
    pub fn value(&mut self) -> Expression {
        let location = self.peek().location;
        let result = self.value_list().and_then(|value| {
            if self.at(TokenKind::Eof) {
                Ok(value)
            } else {
                Err(self.unexpected("end of value"))
            }
        });
        match result {
            Ok(value) => value,
            Err(error) => {
                self.report(error);
                Expression::new(ExprKind::Erroneous, location)
            }
        }
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth(&self, n: usize) -> &Token<'a> {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_keyword(&self, word: &str) -> bool {
        self.at(TokenKind::Ident) && self.peek().value.eq_ignore_ascii_case(word)
    }

    /// Returns the current token and moves past it. Never moves past `Eof`.
    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token<'a>> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::syntax(
            token.location,
            format!("expected {} but found {}", expected, token.describe()),
        )
    }

    fn report(&mut self, error: SyntaxError) {
        self.diagnostics
            .error(error.location, error.kind, error.message);
    }

    fn fail(&mut self, error: SyntaxError) {
        self.report(error);
        self.recover();
    }

    /// Skips to the next statement boundary: past a `;` at block depth zero,
    /// past the end of the first `{...}` block, or up to an enclosing `}`.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn rule(&mut self, nested: bool) -> ParseResult<RuleStatement> {
        let location = self.peek().location;
        let selector = self.selector_group(nested)?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let body = self.block_body();
        Ok(RuleStatement {
            selector,
            body,
            location,
        })
    }

    /// Parses rule body items up to and including the closing `}`.
    fn block_body(&mut self) -> Vec<Statement> {
        let mut body = Vec::new();
        loop {
            let start = self.pos;
            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    let error = self.unexpected("'}'");
                    self.report(error);
                    break;
                }
                TokenKind::Semicolon => {
                    self.advance();
                    continue;
                }
                TokenKind::Dollar => match self.variable_decl() {
                    Ok(variable) => body.push(Statement::Variable(variable)),
                    Err(error) => self.fail(error),
                },
                _ if self.starts_nested_rule() => match self.rule(true) {
                    Ok(rule) => body.push(Statement::Rule(rule)),
                    Err(error) => self.fail(error),
                },
                _ => match self.property_decl() {
                    Ok(property) => body.push(Statement::Property(property)),
                    Err(error) => self.fail(error),
                },
            }
            if self.pos == start && !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                self.advance();
            }
        }
        body
    }

    /// Whether a `{` comes before the next `;` or `}` at bracket depth zero.
    fn starts_nested_rule(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::LBrace if depth == 0 => return true,
                TokenKind::Semicolon | TokenKind::RBrace if depth == 0 => return false,
                _ => {}
            }
        }
        false
    }

    fn variable_decl(&mut self) -> ParseResult<VariableDecl> {
        let location = self.expect(TokenKind::Dollar, "'$'")?.location;
        let name = self.expect(TokenKind::Ident, "variable name")?.value.into_owned();
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.value_list()?;
        self.end_of_declaration()?;
        Ok(VariableDecl {
            name,
            value,
            location,
        })
    }

    fn property_decl(&mut self) -> ParseResult<PropertyDecl> {
        let name_token = self.expect(TokenKind::Ident, "property name")?;
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.value_list()?;
        let important = if self.eat(TokenKind::Bang) {
            if !self.at_keyword("important") {
                return Err(self.unexpected("'important'"));
            }
            self.advance();
            true
        } else {
            false
        };
        self.end_of_declaration()?;
        Ok(PropertyDecl {
            name: name_token.value.to_ascii_lowercase(),
            value,
            important,
            location: name_token.location,
        })
    }

    fn end_of_declaration(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// One or more whitespace-separated expressions.
    fn value_list(&mut self) -> ParseResult<Expression> {
        let first = self.expression()?;
        if !self.starts_value() {
            return Ok(first);
        }
        let location = first.location;
        let mut items = vec![first];
        while self.starts_value() {
            items.push(self.expression()?);
        }
        Ok(Expression::new(ExprKind::List(items), location))
    }

    fn starts_value(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Ident
                | TokenKind::Hash
                | TokenKind::String
                | TokenKind::Number(..)
                | TokenKind::Dollar
                | TokenKind::LParen
                | TokenKind::Minus
        )
    }

    fn expression(&mut self) -> ParseResult<Expression> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                // `a -b` is a list of two values, `a - b` and `a-b` subtract
                TokenKind::Minus if !(self.peek().spaced && !self.peek_nth(1).spaced) => {
                    BinaryOp::Sub
                }
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> ParseResult<Expression> {
        if !self.at(TokenKind::Minus) {
            return self.term();
        }
        let location = self.advance().location;
        let operand = self.unary()?;
        let kind = match operand.kind {
            ExprKind::Number { value, unit } => ExprKind::Number {
                value: -value,
                unit,
            },
            _ => ExprKind::Negate(Box::new(operand)),
        };
        Ok(Expression::new(kind, location))
    }

    fn term(&mut self) -> ParseResult<Expression> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Number(value, unit) => {
                self.advance();
                ExprKind::Number { value, unit }
            }
            TokenKind::String => {
                self.advance();
                ExprKind::String(token.value.into_owned())
            }
            TokenKind::Hash => {
                self.advance();
                let color = Color::from_hex(&token.value).map_err(|e| {
                    SyntaxError::syntax(
                        token.location,
                        format!("invalid color '{}': {}", token.text, e),
                    )
                })?;
                ExprKind::Color(color)
            }
            TokenKind::Dollar => {
                self.advance();
                let name = self.expect(TokenKind::Ident, "variable name")?;
                ExprKind::Variable(name.value.into_owned())
            }
            TokenKind::Ident
                if self.peek_nth(1).kind == TokenKind::LParen && !self.peek_nth(1).spaced =>
            {
                return self.call();
            }
            TokenKind::Ident => {
                self.advance();
                ExprKind::Keyword(token.value.into_owned())
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("a value")),
        };
        Ok(Expression::new(kind, token.location))
    }

    fn call(&mut self) -> ParseResult<Expression> {
        let name = self.advance();
        self.advance();

        let mut args = Vec::new();
        if !self.eat(TokenKind::RParen) {
            loop {
                match self.expression() {
                    Ok(arg) => args.push(arg),
                    Err(error) => {
                        let location = error.location;
                        self.report(error);
                        self.skip_argument();
                        args.push(Expression::new(ExprKind::Erroneous, location));
                    }
                }
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }

        Ok(Expression::new(
            ExprKind::Call {
                name: name.value.to_ascii_lowercase(),
                args,
            },
            name.location,
        ))
    }

    /// Skips a malformed call argument up to the next `,` or `)`.
    fn skip_argument(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::RParen if depth == 0 => return,
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => {
                    return;
                }
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }
}

fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    let location = left.location;
    Expression::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        location,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;

    fn parse_value(source: &str) -> (Expression, Diagnostics) {
        let mut parser = Parser::new(source, "test");
        let value = parser.value();
        (value, parser.into_diagnostics())
    }

    fn number(value: f32, unit: Unit) -> ExprKind {
        ExprKind::Number { value, unit }
    }

    #[test]
    fn test_precedence() {
        let (value, diagnostics) = parse_value("1 + 2 * 3");
        assert!(diagnostics.is_empty());
        let ExprKind::Binary { op, right, .. } = value.kind else {
            panic!("expected binary, got {:?}", value.kind);
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_minus_spacing_rule() {
        let (list, _) = parse_value("4px -2px");
        let ExprKind::List(items) = list.kind else {
            panic!("expected list");
        };
        assert_eq!(items[1].kind, number(-2.0, Unit::Px));

        let (sub, _) = parse_value("4px - 2px");
        assert!(matches!(sub.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));

        let (tight, _) = parse_value("4px-2px");
        assert!(matches!(tight.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn test_call_arguments() {
        let (call, diagnostics) = parse_value("rgb(255, 0, $blue)");
        assert!(diagnostics.is_empty());
        let ExprKind::Call { name, args } = call.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "rgb");
        assert_eq!(args.len(), 3);
        assert_eq!(args[2].kind, ExprKind::Variable("blue".into()));
    }

    #[test]
    fn test_bad_argument_becomes_erroneous() {
        let (call, diagnostics) = parse_value("rgb(1, }, 3)");
        assert!(call.is_erroneous());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_hex_color_term() {
        let (value, _) = parse_value("#ff0000");
        assert_eq!(value.kind, ExprKind::Color(Color::rgb(255, 0, 0)));

        let (short, diagnostics) = parse_value("#ff00");
        assert_eq!(short.kind, ExprKind::Color(Color::rgba(255, 255, 0, 0)));
        assert!(diagnostics.is_empty());

        let (_, diagnostics) = parse_value("#zz");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_important_flag() {
        let mut parser = Parser::new("color: red !important; width: 1px", "test");
        let inline = parser.inline_style();
        assert!(inline.properties[0].important);
        assert!(!inline.properties[1].important);
    }

    #[test]
    fn test_recovery_keeps_following_declarations() {
        let mut parser = Parser::new("a { color: ; width: 1px; height 2px; min-width: 3px }", "test");
        let sheet = parser.stylesheet();
        let names: Vec<&str> = sheet.rules[0]
            .body
            .iter()
            .filter_map(|s| match s {
                Statement::Property(p) => Some(p.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["width", "min-width"]);
        assert_eq!(parser.diagnostics().len(), 2);
    }

    #[test]
    fn test_bad_rule_does_not_hide_next_rule() {
        let mut parser = Parser::new("a:nope { color: red; } b { color: blue; }", "test");
        let sheet = parser.stylesheet();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector.to_string(), "b");
        assert_eq!(parser.diagnostics().entries()[0].kind, ErrorKind::Semantic);
    }

    #[test]
    fn test_unclosed_block_is_reported() {
        let mut parser = Parser::new("a { color: red;", "test");
        let sheet = parser.stylesheet();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn test_nested_rule_detection() {
        let mut parser = Parser::new("a { color: red; &:hover { color: blue } b { width: 1px } }", "test");
        let sheet = parser.stylesheet();
        assert!(parser.diagnostics().is_empty());
        let nested = sheet.rules[0]
            .body
            .iter()
            .filter(|s| matches!(s, Statement::Rule(_)))
            .count();
        assert_eq!(nested, 2);
    }

    #[test]
    fn test_parser_always_terminates() {
        for source in ["}}}{{{", "a { b { c {", ";;;:::", "$", "a, { }", "@@@ { x: y }", "a { x: rgb( }"] {
            let mut parser = Parser::new(source, "fuzz");
            parser.stylesheet();
        }
    }
}
