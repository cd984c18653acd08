//! Selector AST, specificity and text form.
//!
//! A [`Selector`] is a closed tree built bottom-up by the parser:
//!
//! - simple matchers: `*`, `tag`, `#id`, `.class`, `[attr op value]`,
//!   `:pseudo-class`, `:pseudo-function(...)`
//! - [`Selector::Compound`]: simple matchers that all apply to one element
//! - [`Selector::Combinator`]: `left <kind> right`, nested to the left, so
//!   `a > b c` is `Combinator(Descendant, Combinator(Child, a, b), c)`
//! - [`Selector::Group`]: comma-separated alternatives
//!
//! The [`Display`](fmt::Display) form is valid selector text; parsing it again
//! yields an equal selector.

pub mod matching;

use std::fmt;
use std::ops::Add;

use bitflags::bitflags;
use phf::phf_map;

pub use matching::matches;

/// CSS specificity: `(ids, classes, types)`, compared lexicographically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub types: u32,
}

impl Specificity {
    pub const fn new(ids: u32, classes: u32, types: u32) -> Self {
        Self {
            ids,
            classes,
            types,
        }
    }
}

impl Add for Specificity {
    type Output = Specificity;

    fn add(self, other: Specificity) -> Specificity {
        Specificity {
            ids: self.ids + other.ids,
            classes: self.classes + other.classes,
            types: self.types + other.types,
        }
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.ids, self.classes, self.types)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    AdjacentSibling,
    /// `a ~ b`
    Sibling,
}

impl CombinatorKind {
    fn symbol(self) -> &'static str {
        match self {
            CombinatorKind::Descendant => " ",
            CombinatorKind::Child => " > ",
            CombinatorKind::AdjacentSibling => " + ",
            CombinatorKind::Sibling => " ~ ",
        }
    }
}

/// Attribute comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeOp {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals,
    /// `[name~=value]`: whitespace-separated word
    Includes,
    /// `[name|=value]`: exact or `value-` prefix
    DashMatch,
    /// `[name^=value]`
    Prefix,
    /// `[name$=value]`
    Suffix,
    /// `[name*=value]`
    Substring,
}

impl AttributeOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AttributeOp::Exists => "",
            AttributeOp::Equals => "=",
            AttributeOp::Includes => "~=",
            AttributeOp::DashMatch => "|=",
            AttributeOp::Prefix => "^=",
            AttributeOp::Suffix => "$=",
            AttributeOp::Substring => "*=",
        }
    }

    pub fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            AttributeOp::Exists => true,
            AttributeOp::Equals => actual == expected,
            AttributeOp::Includes => {
                !expected.is_empty() && actual.split_whitespace().any(|w| w == expected)
            }
            AttributeOp::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttributeOp::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    Hover,
    Active,
    Root,
    Enabled,
    Disabled,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
}

static PSEUDO_CLASSES: phf::Map<&'static str, PseudoClass> = phf_map! {
    "hover" => PseudoClass::Hover,
    "active" => PseudoClass::Active,
    "root" => PseudoClass::Root,
    "enabled" => PseudoClass::Enabled,
    "disabled" => PseudoClass::Disabled,
    "first-child" => PseudoClass::FirstChild,
    "last-child" => PseudoClass::LastChild,
    "only-child" => PseudoClass::OnlyChild,
    "first-of-type" => PseudoClass::FirstOfType,
    "last-of-type" => PseudoClass::LastOfType,
    "only-of-type" => PseudoClass::OnlyOfType,
};

impl PseudoClass {
    pub fn from_name(name: &str) -> Option<Self> {
        PSEUDO_CLASSES.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            PseudoClass::Hover => "hover",
            PseudoClass::Active => "active",
            PseudoClass::Root => "root",
            PseudoClass::Enabled => "enabled",
            PseudoClass::Disabled => "disabled",
            PseudoClass::FirstChild => "first-child",
            PseudoClass::LastChild => "last-child",
            PseudoClass::OnlyChild => "only-child",
            PseudoClass::FirstOfType => "first-of-type",
            PseudoClass::LastOfType => "last-of-type",
            PseudoClass::OnlyOfType => "only-of-type",
        }
    }
}

bitflags! {
    /// State pseudo-classes referenced by a selector or stylesheet.
    ///
    /// Flipping a host flag only invalidates styles when some attached
    /// stylesheet references the matching pseudo-class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatePseudos: u8 {
        const HOVER  = 0b01;
        const ACTIVE = 0b10;
    }
}

/// The `an+b` progression of the structural pseudo-functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnB {
    pub a: i32,
    pub b: i32,
}

impl AnB {
    pub const EVEN: AnB = AnB::new(2, 0);
    pub const ODD: AnB = AnB::new(2, 1);

    pub const fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Whether a 1-based `index` equals `a*k + b` for some integer `k >= 0`.
    pub fn matches(self, index: usize) -> bool {
        let index = index as i64;
        let (a, b) = (self.a as i64, self.b as i64);
        if a == 0 {
            return index == b;
        }
        let offset = index - b;
        offset % a == 0 && offset / a >= 0
    }
}

impl fmt::Display for AnB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.a {
            0 => return write!(f, "{}", self.b),
            1 => f.write_str("n")?,
            -1 => f.write_str("-n")?,
            a => write!(f, "{}n", a)?,
        }
        match self.b {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{}", b),
            b => write!(f, "{}", b),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PseudoFunction {
    NthChild {
        anb: AnB,
        of: Option<Box<Selector>>,
    },
    NthLastChild {
        anb: AnB,
        of: Option<Box<Selector>>,
    },
    NthOfType(AnB),
    NthLastOfType(AnB),
    Not(Box<Selector>),
    Is(Box<Selector>),
}

impl PseudoFunction {
    pub fn name(&self) -> &'static str {
        match self {
            PseudoFunction::NthChild { .. } => "nth-child",
            PseudoFunction::NthLastChild { .. } => "nth-last-child",
            PseudoFunction::NthOfType(_) => "nth-of-type",
            PseudoFunction::NthLastOfType(_) => "nth-last-of-type",
            PseudoFunction::Not(_) => "not",
            PseudoFunction::Is(_) => "is",
        }
    }

    fn argument(&self) -> Option<&Selector> {
        match self {
            PseudoFunction::NthChild { of, .. } | PseudoFunction::NthLastChild { of, .. } => {
                of.as_deref()
            }
            PseudoFunction::Not(inner) | PseudoFunction::Is(inner) => Some(inner),
            PseudoFunction::NthOfType(_) | PseudoFunction::NthLastOfType(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `*`
    MatchAll,
    TagName(String),
    Id(String),
    ClassName(String),
    Attribute {
        name: String,
        op: AttributeOp,
        value: Option<String>,
    },
    PseudoClass(PseudoClass),
    PseudoFunction(PseudoFunction),
    /// `&` inside a nested rule. Replaced while flattening; never matched.
    Parent,
    Compound(Vec<Selector>),
    Combinator {
        kind: CombinatorKind,
        left: Box<Selector>,
        right: Box<Selector>,
    },
    Group(Vec<Selector>),
}

impl Selector {
    pub fn combinator(kind: CombinatorKind, left: Selector, right: Selector) -> Self {
        Selector::Combinator {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            Selector::MatchAll | Selector::Parent => Specificity::default(),
            Selector::TagName(_) => Specificity::new(0, 0, 1),
            Selector::Id(_) => Specificity::new(1, 0, 0),
            // Attributes and pseudo-functions weigh the same as classes
            Selector::ClassName(_)
            | Selector::Attribute { .. }
            | Selector::PseudoClass(_)
            | Selector::PseudoFunction(_) => Specificity::new(0, 1, 0),
            Selector::Compound(parts) => parts
                .iter()
                .fold(Specificity::default(), |acc, s| acc + s.specificity()),
            Selector::Combinator { left, right, .. } => left.specificity() + right.specificity(),
            Selector::Group(alternatives) => alternatives
                .iter()
                .map(Selector::specificity)
                .max()
                .unwrap_or_default(),
        }
    }

    /// The comma-separated alternatives of a group, or the selector itself.
    pub fn alternatives(&self) -> &[Selector] {
        match self {
            Selector::Group(alternatives) => alternatives,
            other => std::slice::from_ref(other),
        }
    }

    pub fn into_alternatives(self) -> Vec<Selector> {
        match self {
            Selector::Group(alternatives) => alternatives,
            other => vec![other],
        }
    }

    /// Whether `&` appears anywhere outside pseudo-function arguments.
    pub fn has_parent_reference(&self) -> bool {
        match self {
            Selector::Parent => true,
            Selector::Compound(parts) => parts.iter().any(Selector::has_parent_reference),
            Selector::Combinator { left, right, .. } => {
                left.has_parent_reference() || right.has_parent_reference()
            }
            Selector::Group(alternatives) => alternatives.iter().any(Selector::has_parent_reference),
            _ => false,
        }
    }

    /// The state pseudo-classes this selector depends on.
    pub fn state_pseudos(&self) -> StatePseudos {
        match self {
            Selector::PseudoClass(PseudoClass::Hover) => StatePseudos::HOVER,
            Selector::PseudoClass(PseudoClass::Active) => StatePseudos::ACTIVE,
            Selector::PseudoFunction(function) => function
                .argument()
                .map(Selector::state_pseudos)
                .unwrap_or_default(),
            Selector::Compound(parts) | Selector::Group(parts) => parts
                .iter()
                .fold(StatePseudos::empty(), |acc, s| acc | s.state_pseudos()),
            Selector::Combinator { left, right, .. } => left.state_pseudos() | right.state_pseudos(),
            _ => StatePseudos::empty(),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' | '\\' => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for PseudoFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}(", self.name())?;
        match self {
            PseudoFunction::NthChild { anb, of } | PseudoFunction::NthLastChild { anb, of } => {
                write!(f, "{}", anb)?;
                if let Some(of) = of {
                    write!(f, " of {}", of)?;
                }
            }
            PseudoFunction::NthOfType(anb) | PseudoFunction::NthLastOfType(anb) => {
                write!(f, "{}", anb)?
            }
            PseudoFunction::Not(inner) | PseudoFunction::Is(inner) => write!(f, "{}", inner)?,
        }
        f.write_str(")")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::MatchAll => f.write_str("*"),
            Selector::TagName(name) => f.write_str(name),
            Selector::Id(id) => write!(f, "#{}", id),
            Selector::ClassName(class) => write!(f, ".{}", class),
            Selector::Attribute { name, op, value } => {
                write!(f, "[{}", name)?;
                if let Some(value) = value {
                    f.write_str(op.symbol())?;
                    write_quoted(f, value)?;
                }
                f.write_str("]")
            }
            Selector::PseudoClass(pseudo) => write!(f, ":{}", pseudo.name()),
            Selector::PseudoFunction(function) => function.fmt(f),
            Selector::Parent => f.write_str("&"),
            Selector::Compound(parts) => parts.iter().try_for_each(|p| p.fmt(f)),
            Selector::Combinator { kind, left, right } => {
                write!(f, "{}{}{}", left, kind.symbol(), right)
            }
            Selector::Group(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    alternative.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}
