//! Syntax trees produced by the [`Parser`](crate::parser::Parser).
//!
//! Expressions stay unevaluated here; the [`eval`](crate::eval) module turns
//! them into [`Value`](crate::types::Value)s once variables and functions are
//! in scope.

use std::fmt;

use crate::diagnostics::Location;
use crate::selector::Selector;
use crate::types::{Color, Unit};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// `$name`
    Variable(String),
    String(String),
    Number { value: f32, unit: Unit },
    /// `#rgb`, `#rrggbb`, ...
    Color(Color),
    /// A bare identifier: a keyword, a named color or a plain word.
    Keyword(String),
    Call { name: String, args: Vec<Expression> },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
    /// Whitespace-separated values, as in `padding: 1px 2px`.
    List(Vec<Expression>),
    /// Placeholder for text that failed to parse. Its diagnostic has already
    /// been reported.
    Erroneous,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub location: Location,
}

impl Expression {
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Self { kind, location }
    }

    pub fn is_erroneous(&self) -> bool {
        match &self.kind {
            ExprKind::Erroneous => true,
            ExprKind::Call { args, .. } => args.iter().any(Expression::is_erroneous),
            ExprKind::Binary { left, right, .. } => left.is_erroneous() || right.is_erroneous(),
            ExprKind::Negate(inner) => inner.is_erroneous(),
            ExprKind::List(items) => items.iter().any(Expression::is_erroneous),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub value: Expression,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub value: Expression,
    pub important: bool,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleStatement {
    /// May contain [`Selector::Parent`] when nested.
    pub selector: Selector,
    pub body: Vec<Statement>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Variable(VariableDecl),
    Property(PropertyDecl),
    Rule(RuleStatement),
}

/// A whole stylesheet: sheet-level variables and top-level rules, each in
/// source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetStatement {
    pub variables: Vec<VariableDecl>,
    pub rules: Vec<RuleStatement>,
}

/// The declarations of a `style` attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InlineStyleStatement {
    pub properties: Vec<PropertyDecl>,
}
