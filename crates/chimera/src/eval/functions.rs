//! Functions callable from style expressions.
//!
//! Every function declares the argument counts it accepts; the evaluator
//! checks arity before arguments are evaluated.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::EvalError;
use crate::properties::{PropertyKey, PropertySet};
use crate::types::{Color, Primitive, Unit, Value};

/// What a function invocation can see besides its arguments.
#[derive(Clone, Copy, Debug)]
pub struct CallContext<'a> {
    /// Name the function was called by.
    pub name: &'a str,
    /// Properties already compiled into the current rule, if any.
    pub properties: Option<&'a PropertySet>,
    /// Properties whose declaration is being evaluated right now.
    pub evaluating: &'a [PropertyKey],
}

impl<'a> CallContext<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            properties: None,
            evaluating: &[],
        }
    }

    fn invalid(&self, index: usize, reason: impl Into<String>) -> EvalError {
        EvalError::InvalidArgument {
            name: self.name.to_string(),
            index: index + 1,
            reason: reason.into(),
        }
    }

    fn primitive(&self, args: &[Value], index: usize) -> Result<Primitive, EvalError> {
        args[index].as_primitive().ok_or_else(|| {
            self.invalid(index, format!("expected a number, found {}", args[index].type_name()))
        })
    }

    fn color(&self, args: &[Value], index: usize) -> Result<Color, EvalError> {
        args[index].as_color().ok_or_else(|| {
            self.invalid(index, format!("expected a color, found {}", args[index].type_name()))
        })
    }

    /// A fraction in `0..=1`, written as a percentage or a plain number.
    fn fraction(&self, args: &[Value], index: usize) -> Result<f32, EvalError> {
        let p = self.primitive(args, index)?;
        match p.unit {
            Unit::Percent => Ok(p.value / 100.0),
            Unit::None => Ok(p.value),
            _ => Err(self.invalid(index, "expected a percentage or a fraction")),
        }
    }

    /// An RGB channel in `0..=255`, or a percentage of it.
    fn channel(&self, args: &[Value], index: usize) -> Result<f32, EvalError> {
        let p = self.primitive(args, index)?;
        match p.unit {
            Unit::Percent => Ok(p.value * 2.55),
            Unit::None => Ok(p.value),
            _ => Err(self.invalid(index, "expected a channel value or percentage")),
        }
    }

    fn unitless(&self, args: &[Value], index: usize) -> Result<f32, EvalError> {
        let p = self.primitive(args, index)?;
        if p.unit == Unit::None {
            Ok(p.value)
        } else {
            Err(self.invalid(index, format!("expected a unitless number, found {}", p)))
        }
    }

    /// Brings every argument to one common unit.
    fn unified(&self, args: &[Value]) -> Result<(Vec<f32>, Unit), EvalError> {
        let mut unit = Unit::None;
        let mut values = Vec::with_capacity(args.len());
        for index in 0..args.len() {
            let p = self.primitive(args, index)?;
            unit = unit.unify(p.unit).ok_or_else(|| {
                self.invalid(index, format!("'{}' does not match the other arguments' unit", p))
            })?;
            values.push(p.value);
        }
        Ok((values, unit))
    }
}

/// A function that can be called from a style expression.
pub trait StyleFunction: Send + Sync {
    /// Accepted argument counts.
    fn arity(&self) -> RangeInclusive<usize>;

    /// Invokes the function. `args.len()` is always within [`arity`](Self::arity).
    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError>;
}

/// Functions by name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn StyleFunction>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every builtin function.
    pub fn builtins() -> Self {
        let mut registry = Self::new();
        registry.register("rgb", RgbFunction);
        registry.register("rgba", RgbFunction);
        registry.register("hsl", HslFunction);
        registry.register("hsla", HslFunction);
        registry.register("brighten", BrightnessFunction { darken: false });
        registry.register("darken", BrightnessFunction { darken: true });

        for op in MathOp::ALL {
            registry.register(op.name(), MathFunction(op));
        }
        registry.register("max", MinMaxFunction { max: true });
        registry.register("min", MinMaxFunction { max: false });
        registry.register("atan2", Atan2Function);
        registry.register("clamp", ClampFunction);
        registry.register("prop", PropertyFunction);
        registry
    }

    /// Registers `function`, replacing any previous function of that name.
    /// Names are case-insensitive.
    pub fn register(&mut self, name: impl Into<String>, function: impl StyleFunction + 'static) {
        let name = name.into().to_ascii_lowercase();
        self.functions.insert(name, Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn StyleFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}

/// The builtin functions, shared by every compile call that does not bring
/// its own registry.
pub static BUILTINS: Lazy<Arc<FunctionRegistry>> =
    Lazy::new(|| Arc::new(FunctionRegistry::builtins()));

/// `rgb(r, g, b[, alpha])` and `rgba(...)`.
struct RgbFunction;

impl StyleFunction for RgbFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        3..=4
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let alpha = match args.len() {
            4 => ctx.fraction(args, 3)?,
            _ => 1.0,
        };
        Ok(Value::Color(Color::from_channels(
            ctx.channel(args, 0)?,
            ctx.channel(args, 1)?,
            ctx.channel(args, 2)?,
            alpha,
        )))
    }
}

/// `hsl(hue, saturation, lightness[, alpha])` and `hsla(...)`.
struct HslFunction;

impl StyleFunction for HslFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        3..=4
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let hue = ctx.primitive(args, 0)?;
        let degrees = match hue.unit {
            Unit::Deg | Unit::None => hue.value,
            Unit::Rad => hue.value.to_degrees(),
            _ => return Err(ctx.invalid(0, "expected a hue angle")),
        };
        let alpha = match args.len() {
            4 => ctx.fraction(args, 3)?,
            _ => 1.0,
        };
        Ok(Value::Color(Color::from_hsl(
            degrees.rem_euclid(360.0),
            ctx.fraction(args, 1)?.clamp(0.0, 1.0),
            ctx.fraction(args, 2)?.clamp(0.0, 1.0),
            alpha,
        )))
    }
}

/// `brighten(color[, amount])` / `darken(color[, amount])`.
struct BrightnessFunction {
    darken: bool,
}

impl BrightnessFunction {
    const DEFAULT_AMOUNT: f32 = 0.1;
}

impl StyleFunction for BrightnessFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        1..=2
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let color = ctx.color(args, 0)?;
        let amount = match args.len() {
            2 => ctx.fraction(args, 1)?,
            _ => Self::DEFAULT_AMOUNT,
        };
        Ok(Value::Color(if self.darken {
            color.darken(amount)
        } else {
            color.brighten(amount)
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MathOp {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Sign,
    Exp,
    Atan,
    Asin,
    Acos,
    Abs,
}

impl MathOp {
    const ALL: [MathOp; 10] = [
        MathOp::Sqrt,
        MathOp::Sin,
        MathOp::Cos,
        MathOp::Tan,
        MathOp::Sign,
        MathOp::Exp,
        MathOp::Atan,
        MathOp::Asin,
        MathOp::Acos,
        MathOp::Abs,
    ];

    fn name(self) -> &'static str {
        match self {
            MathOp::Sqrt => "sqrt",
            MathOp::Sin => "sin",
            MathOp::Cos => "cos",
            MathOp::Tan => "tan",
            MathOp::Sign => "sign",
            MathOp::Exp => "exp",
            MathOp::Atan => "atan",
            MathOp::Asin => "asin",
            MathOp::Acos => "acos",
            MathOp::Abs => "abs",
        }
    }
}

/// Single-argument math.
///
/// `sqrt` and `abs` keep the argument's unit, the trigonometric functions
/// take an angle (`deg`, `rad` or unitless radians) and the inverse ones
/// return radians.
struct MathFunction(MathOp);

impl StyleFunction for MathFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let p = ctx.primitive(args, 0)?;
        let angle = || p.radians().ok_or_else(|| ctx.invalid(0, "expected an angle"));

        let result = match self.0 {
            MathOp::Sqrt if p.value < 0.0 => {
                return Err(EvalError::Invocation(format!(
                    "sqrt of a negative number ({})",
                    p
                )));
            }
            MathOp::Sqrt => Primitive::new(p.value.sqrt(), p.unit),
            MathOp::Abs => Primitive::new(p.value.abs(), p.unit),
            MathOp::Sign if p.value == 0.0 => Primitive::number(0.0),
            MathOp::Sign => Primitive::number(p.value.signum()),
            MathOp::Exp => Primitive::number(ctx.unitless(args, 0)?.exp()),
            MathOp::Sin => Primitive::number(angle()?.sin()),
            MathOp::Cos => Primitive::number(angle()?.cos()),
            MathOp::Tan => Primitive::number(angle()?.tan()),
            MathOp::Atan => Primitive::new(ctx.unitless(args, 0)?.atan(), Unit::Rad),
            MathOp::Asin | MathOp::Acos => {
                let x = ctx.unitless(args, 0)?;
                if !(-1.0..=1.0).contains(&x) {
                    return Err(ctx.invalid(0, format!("{} is outside -1..1", x)));
                }
                let radians = if self.0 == MathOp::Asin { x.asin() } else { x.acos() };
                Primitive::new(radians, Unit::Rad)
            }
        };
        Ok(Value::Primitive(result))
    }
}

/// `max(a, b)` / `min(a, b)`.
struct MinMaxFunction {
    max: bool,
}

impl StyleFunction for MinMaxFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        2..=2
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let (values, unit) = ctx.unified(args)?;
        let pick = if self.max { f32::max } else { f32::min };
        let result = values.into_iter().reduce(pick).unwrap_or_default();
        Ok(Value::Primitive(Primitive::new(result, unit)))
    }
}

/// `atan2(y, x)`, in radians.
struct Atan2Function;

impl StyleFunction for Atan2Function {
    fn arity(&self) -> RangeInclusive<usize> {
        2..=2
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let (values, _) = ctx.unified(args)?;
        Ok(Value::Primitive(Primitive::new(
            values[0].atan2(values[1]),
            Unit::Rad,
        )))
    }
}

/// `clamp(value, min, max)`.
struct ClampFunction;

impl StyleFunction for ClampFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        3..=3
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let (values, unit) = ctx.unified(args)?;
        let (value, lo, hi) = (values[0], values[1], values[2]);
        if lo > hi {
            return Err(EvalError::Invocation(format!(
                "clamp bounds are reversed ({} > {})",
                lo, hi
            )));
        }
        Ok(Value::Primitive(Primitive::new(value.clamp(lo, hi), unit)))
    }
}

/// `prop(name)`: the value another declaration of the current rule already
/// compiled to.
struct PropertyFunction;

impl StyleFunction for PropertyFunction {
    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
        let name = match &args[0] {
            Value::String(name) => name.as_str(),
            Value::Keyword(keyword) => keyword.name(),
            other => {
                return Err(ctx.invalid(
                    0,
                    format!("expected a property name, found {}", other.type_name()),
                ));
            }
        };
        let key = PropertyKey::from_name(name)
            .ok_or_else(|| ctx.invalid(0, format!("unknown property '{}'", name)))?;

        if ctx.evaluating.contains(&key) {
            return Err(EvalError::SelfReference(key.name().to_string()));
        }
        ctx.properties
            .and_then(|set| set.get(key))
            .cloned()
            .ok_or_else(|| EvalError::UnsetProperty(key.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let function = BUILTINS.get(name).expect("builtin exists");
        assert!(function.arity().contains(&args.len()));
        function.invoke(&CallContext::new(name), args)
    }

    #[test]
    fn test_builtin_names() {
        let mut names: Vec<_> = BUILTINS.names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            [
                "abs", "acos", "asin", "atan", "atan2", "brighten", "clamp", "cos", "darken",
                "exp", "hsl", "hsla", "max", "min", "prop", "rgb", "rgba", "sign", "sin", "sqrt",
                "tan",
            ]
        );
    }

    #[test]
    fn test_rgb() {
        let color = call("rgb", &[Value::number(255.0), Value::number(0.0), Value::percent(100.0)]);
        assert_eq!(color, Ok(Value::Color(Color::rgb(255, 0, 255))));

        let color = call(
            "rgba",
            &[Value::number(0.0), Value::number(0.0), Value::number(0.0), Value::number(0.5)],
        );
        assert_eq!(color, Ok(Value::Color(Color::rgba(0, 0, 0, 128))));

        let err = call("rgb", &[Value::px(1.0), Value::number(0.0), Value::number(0.0)]);
        assert!(matches!(err, Err(EvalError::InvalidArgument { index: 1, .. })));
    }

    #[test]
    fn test_hsl() {
        let red = call("hsl", &[Value::number(0.0), Value::percent(100.0), Value::percent(50.0)]);
        assert_eq!(red, Ok(Value::Color(Color::rgb(255, 0, 0))));
    }

    #[test]
    fn test_brighten_and_darken() {
        let gray = Value::Color(Color::rgb(128, 128, 128));
        let lighter = call("brighten", &[gray.clone(), Value::percent(20.0)]).unwrap();
        let darker = call("darken", &[gray.clone()]).unwrap();

        let lightness = |v: &Value| v.as_color().unwrap().to_hsl().2;
        assert!(lightness(&lighter) > lightness(&gray));
        assert!(lightness(&darker) < lightness(&gray));

        let err = call("darken", &[Value::px(3.0)]);
        assert!(matches!(err, Err(EvalError::InvalidArgument { .. })));
    }

    #[test]
    fn test_unary_math() {
        assert_eq!(call("sqrt", &[Value::px(16.0)]), Ok(Value::px(4.0)));
        assert_eq!(call("abs", &[Value::percent(-5.0)]), Ok(Value::percent(5.0)));
        assert_eq!(call("sign", &[Value::number(-3.0)]), Ok(Value::number(-1.0)));
        assert_eq!(call("sign", &[Value::number(0.0)]), Ok(Value::number(0.0)));
        assert_eq!(
            call("sin", &[Value::Primitive(Primitive::new(90.0, Unit::Deg))]),
            Ok(Value::number(1.0))
        );
        assert_eq!(
            call("acos", &[Value::number(1.0)]),
            Ok(Value::Primitive(Primitive::new(0.0, Unit::Rad)))
        );
        assert!(call("sin", &[Value::px(1.0)]).is_err());
        assert!(call("sqrt", &[Value::number(-1.0)]).is_err());
        assert!(call("asin", &[Value::number(2.0)]).is_err());
    }

    #[test]
    fn test_min_max_clamp_unify_units() {
        assert_eq!(call("max", &[Value::px(1.0), Value::number(3.0)]), Ok(Value::px(3.0)));
        assert_eq!(
            call("min", &[Value::px(1.0), Value::px(-2.0)]),
            Ok(Value::px(-2.0))
        );
        assert_eq!(
            call("clamp", &[Value::px(15.0), Value::px(0.0), Value::px(10.0)]),
            Ok(Value::px(10.0))
        );
        assert!(call("max", &[Value::px(1.0), Value::percent(3.0)]).is_err());
        assert!(call("min", &[Value::px(1.0), Value::px(2.0), Value::px(3.0)]).is_err());
        assert!(call("clamp", &[Value::px(1.0), Value::px(5.0), Value::px(0.0)]).is_err());
    }

    #[test]
    fn test_prop_reads_current_rule() {
        let mut set = PropertySet::new();
        set.set(PropertyKey::PaddingLeft, Value::px(4.0)).unwrap();
        let prop = BUILTINS.get("prop").unwrap();

        let ctx = CallContext {
            name: "prop",
            properties: Some(&set),
            evaluating: &[PropertyKey::PaddingRight],
        };
        let value = prop.invoke(&ctx, &[Value::String("padding-left".into())]);
        assert_eq!(value, Ok(Value::px(4.0)));

        let unset = prop.invoke(&ctx, &[Value::String("margin-top".into())]);
        assert_eq!(unset, Err(EvalError::UnsetProperty("margin-top".into())));

        let ctx = CallContext {
            evaluating: &[PropertyKey::PaddingLeft],
            ..ctx
        };
        let cycle = prop.invoke(&ctx, &[Value::String("padding-left".into())]);
        assert_eq!(cycle, Err(EvalError::SelfReference("padding-left".into())));
    }

    #[test]
    fn test_custom_function() {
        struct Double;

        impl StyleFunction for Double {
            fn arity(&self) -> RangeInclusive<usize> {
                1..=1
            }

            fn invoke(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, EvalError> {
                let p = ctx.primitive(args, 0)?;
                Ok(Value::Primitive(Primitive::new(p.value * 2.0, p.unit)))
            }
        }

        let mut registry = FunctionRegistry::new();
        registry.register("Double", Double);
        assert!(registry.contains("double"));
        assert!(!registry.contains("rgb"));
    }
}
