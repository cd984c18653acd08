//! Expression evaluation.
//!
//! An [`Environment`] bundles a scope, the function registry and what the
//! current rule has compiled so far; [`Environment::evaluate`] reduces an
//! [`Expression`] to a [`Value`].

mod functions;
mod scope;

pub use functions::{BUILTINS, CallContext, FunctionRegistry, StyleFunction};
pub use scope::{ScopeArena, ScopeId};

use thiserror::Error;

use crate::ast::{BinaryOp, ExprKind, Expression};
use crate::diagnostics::{ErrorKind, Location, Severity};
use crate::properties::{PropertyKey, PropertySet};
use crate::types::{Color, Keyword, Primitive, Unit, Value};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown variable '${0}'")]
    UnknownVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("property '{0}' is not set in this rule")]
    UnsetProperty(String),

    #[error("incompatible units: {left} {op} {right}")]
    IncompatibleUnits {
        op: BinaryOp,
        left: Primitive,
        right: Primitive,
    },
    #[error("cannot apply '{op}' to {left} and {right}")]
    InvalidOperand {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,

    #[error("'{name}' expects {expected} argument(s), found {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("property '{0}' refers to itself")]
    SelfReference(String),
    #[error("argument {index} of '{name}': {reason}")]
    InvalidArgument {
        name: String,
        index: usize,
        reason: String,
    },
    #[error("{0}")]
    Invocation(String),
    #[error("expected a single value, found a list")]
    UnexpectedList,
    #[error("invalid value '{value}' for property '{property}'")]
    InvalidPropertyValue { property: String, value: String },

    /// The expression failed to parse; that failure is already reported.
    #[error("erroneous expression")]
    Erroneous,
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::UnknownVariable(_)
            | EvalError::UnknownFunction(_)
            | EvalError::UnsetProperty(_) => ErrorKind::UnresolvedReference,
            EvalError::IncompatibleUnits { .. }
            | EvalError::InvalidOperand { .. }
            | EvalError::DivisionByZero => ErrorKind::IncompatibleOperand,
            _ => ErrorKind::Semantic,
        }
    }

    /// Unresolved references only drop their declaration and are warnings.
    pub fn severity(&self) -> Severity {
        match self.kind() {
            ErrorKind::UnresolvedReference => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether a diagnostic should be reported for this error.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, EvalError::Erroneous)
    }
}

/// An [`EvalError`] and the location of the expression that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {error}")]
pub struct LocatedError {
    pub location: Location,
    #[source]
    pub error: EvalError,
}

impl LocatedError {
    pub fn new(location: Location, error: EvalError) -> Self {
        Self { location, error }
    }
}

pub type EvalResult<T> = Result<T, LocatedError>;

/// Everything an expression can refer to.
#[derive(Clone, Copy, Debug)]
pub struct Environment<'a> {
    pub scopes: &'a ScopeArena,
    pub scope: ScopeId,
    pub functions: &'a FunctionRegistry,
    /// The current rule's compiled properties, for `prop()`.
    pub properties: Option<&'a PropertySet>,
    /// Keys of the declaration being evaluated.
    pub evaluating: &'a [PropertyKey],
}

impl<'a> Environment<'a> {
    pub fn new(scopes: &'a ScopeArena, scope: ScopeId, functions: &'a FunctionRegistry) -> Self {
        Self {
            scopes,
            scope,
            functions,
            properties: None,
            evaluating: &[],
        }
    }

    pub fn with_properties(self, properties: &'a PropertySet, evaluating: &'a [PropertyKey]) -> Self {
        Self {
            properties: Some(properties),
            evaluating,
            ..self
        }
    }

    /// Evaluates a declaration value, which may be a whitespace-separated
    /// list. Variables holding lists are spliced in place.
    pub fn evaluate_list(&self, expr: &Expression) -> EvalResult<Vec<Value>> {
        let items = match &expr.kind {
            ExprKind::List(items) => items.as_slice(),
            _ => std::slice::from_ref(expr),
        };

        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match &item.kind {
                ExprKind::Variable(name) => values.extend_from_slice(self.variable(item, name)?),
                _ => values.push(self.evaluate(item)?),
            }
        }
        Ok(values)
    }

    /// Evaluates an expression that must produce exactly one value.
    pub fn evaluate(&self, expr: &Expression) -> EvalResult<Value> {
        let fail = |error| LocatedError::new(expr.location, error);

        match &expr.kind {
            ExprKind::Variable(name) => match self.variable(expr, name)? {
                [value] => Ok(value.clone()),
                _ => Err(fail(EvalError::UnexpectedList)),
            },
            ExprKind::String(text) => Ok(Value::String(text.clone())),
            ExprKind::Number { value, unit } => Ok(Value::Primitive(Primitive::new(*value, *unit))),
            ExprKind::Color(color) => Ok(Value::Color(*color)),
            ExprKind::Keyword(word) => Ok(identifier_value(word)),
            ExprKind::Call { name, args } => self.call(expr, name, args),
            ExprKind::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                arithmetic(*op, left, right).map_err(fail)
            }
            ExprKind::Negate(inner) => match self.evaluate(inner)? {
                Value::Primitive(p) => Ok(Value::Primitive(Primitive::new(-p.value, p.unit))),
                other => Err(fail(EvalError::InvalidOperand {
                    op: "-",
                    left: "nothing",
                    right: other.type_name(),
                })),
            },
            ExprKind::List(_) => Err(fail(EvalError::UnexpectedList)),
            ExprKind::Erroneous => Err(fail(EvalError::Erroneous)),
        }
    }

    fn variable(&self, expr: &Expression, name: &str) -> EvalResult<&'a [Value]> {
        self.scopes
            .lookup(self.scope, name)
            .ok_or_else(|| LocatedError::new(expr.location, EvalError::UnknownVariable(name.to_string())))
    }

    fn call(&self, expr: &Expression, name: &str, args: &[Expression]) -> EvalResult<Value> {
        let fail = |error| LocatedError::new(expr.location, error);

        let function = self
            .functions
            .get(name)
            .ok_or_else(|| fail(EvalError::UnknownFunction(name.to_string())))?;

        let arity = function.arity();
        if !arity.contains(&args.len()) {
            let expected = match (arity.start(), arity.end()) {
                (min, max) if min == max => min.to_string(),
                (min, &usize::MAX) => format!("at least {}", min),
                (min, max) => format!("{} to {}", min, max),
            };
            return Err(fail(EvalError::Arity {
                name: name.to_string(),
                expected,
                found: args.len(),
            }));
        }

        let values = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<EvalResult<Vec<_>>>()?;

        let ctx = CallContext {
            name,
            properties: self.properties,
            evaluating: self.evaluating,
        };
        function.invoke(&ctx, &values).map_err(fail)
    }
}

/// A bare identifier is a named color, a keyword, or else a plain word.
fn identifier_value(word: &str) -> Value {
    if let Some(color) = Color::named(word) {
        Value::Color(color)
    } else if let Some(keyword) = Keyword::from_name(word) {
        Value::Keyword(keyword)
    } else {
        Value::String(word.to_string())
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Primitive(l), Value::Primitive(r)) => {
            let incompatible = || EvalError::IncompatibleUnits { op, left: l, right: r };
            let unit = match op {
                BinaryOp::Add | BinaryOp::Sub => l.unit.unify(r.unit).ok_or_else(incompatible)?,
                BinaryOp::Mul => match (l.unit, r.unit) {
                    (unit, Unit::None) | (Unit::None, unit) => unit,
                    _ => return Err(incompatible()),
                },
                BinaryOp::Div => match (l.unit, r.unit) {
                    (unit, Unit::None) => unit,
                    (a, b) if a == b => Unit::None,
                    _ => return Err(incompatible()),
                },
            };
            let value = match op {
                BinaryOp::Add => l.value + r.value,
                BinaryOp::Sub => l.value - r.value,
                BinaryOp::Mul => l.value * r.value,
                BinaryOp::Div if r.value == 0.0 => return Err(EvalError::DivisionByZero),
                BinaryOp::Div => l.value / r.value,
            };
            Ok(Value::Primitive(Primitive::new(value, unit)))
        }
        (Value::String(mut l), Value::String(r)) if op == BinaryOp::Add => {
            l.push_str(&r);
            Ok(Value::String(l))
        }
        (l, r) => Err(EvalError::InvalidOperand {
            op: match op {
                BinaryOp::Add => "+",
                BinaryOp::Sub => "-",
                BinaryOp::Mul => "*",
                BinaryOp::Div => "/",
            },
            left: l.type_name(),
            right: r.type_name(),
        }),
    }
}
