//! Core value types produced by the evaluator and stored in property sets.

pub mod color;
pub mod geometry;

use std::fmt;

use phf::phf_map;

pub use color::{Color, ColorParseError};
pub use geometry::{Primitive, Unit};

/// Identifier values with a fixed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Auto,
    None,
    Inherit,
    True,
    False,
    Visible,
    Hidden,
    Block,
    Inline,
    InlineBlock,
    Flex,
    Left,
    Right,
    Center,
    Top,
    Bottom,
    Start,
    End,
    Row,
    Column,
    RowReverse,
    ColumnReverse,
    Wrap,
    Nowrap,
    SpaceBetween,
    SpaceAround,
    Stretch,
    Baseline,
    BorderBox,
    ContentBox,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "auto" => Keyword::Auto,
    "none" => Keyword::None,
    "inherit" => Keyword::Inherit,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "visible" => Keyword::Visible,
    "hidden" => Keyword::Hidden,
    "block" => Keyword::Block,
    "inline" => Keyword::Inline,
    "inline-block" => Keyword::InlineBlock,
    "flex" => Keyword::Flex,
    "left" => Keyword::Left,
    "right" => Keyword::Right,
    "center" => Keyword::Center,
    "top" => Keyword::Top,
    "bottom" => Keyword::Bottom,
    "start" => Keyword::Start,
    "end" => Keyword::End,
    "row" => Keyword::Row,
    "column" => Keyword::Column,
    "row-reverse" => Keyword::RowReverse,
    "column-reverse" => Keyword::ColumnReverse,
    "wrap" => Keyword::Wrap,
    "nowrap" => Keyword::Nowrap,
    "space-between" => Keyword::SpaceBetween,
    "space-around" => Keyword::SpaceAround,
    "stretch" => Keyword::Stretch,
    "baseline" => Keyword::Baseline,
    "border-box" => Keyword::BorderBox,
    "content-box" => Keyword::ContentBox,
};

impl Keyword {
    pub fn from_name(name: &str) -> Option<Self> {
        KEYWORDS.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Keyword::Auto => "auto",
            Keyword::None => "none",
            Keyword::Inherit => "inherit",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Visible => "visible",
            Keyword::Hidden => "hidden",
            Keyword::Block => "block",
            Keyword::Inline => "inline",
            Keyword::InlineBlock => "inline-block",
            Keyword::Flex => "flex",
            Keyword::Left => "left",
            Keyword::Right => "right",
            Keyword::Center => "center",
            Keyword::Top => "top",
            Keyword::Bottom => "bottom",
            Keyword::Start => "start",
            Keyword::End => "end",
            Keyword::Row => "row",
            Keyword::Column => "column",
            Keyword::RowReverse => "row-reverse",
            Keyword::ColumnReverse => "column-reverse",
            Keyword::Wrap => "wrap",
            Keyword::Nowrap => "nowrap",
            Keyword::SpaceBetween => "space-between",
            Keyword::SpaceAround => "space-around",
            Keyword::Stretch => "stretch",
            Keyword::Baseline => "baseline",
            Keyword::BorderBox => "border-box",
            Keyword::ContentBox => "content-box",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An evaluated style value.
///
/// Values are immutable; their [`Display`](fmt::Display) form is valid
/// stylesheet syntax that evaluates back to an equal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Primitive(Primitive),
    Color(Color),
    Keyword(Keyword),
    String(String),
}

impl Value {
    pub fn px(value: f32) -> Self {
        Value::Primitive(Primitive::px(value))
    }

    pub fn percent(value: f32) -> Self {
        Value::Primitive(Primitive::percent(value))
    }

    pub fn number(value: f32) -> Self {
        Value::Primitive(Primitive::number(value))
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Value::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        match self {
            Value::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short description of the value's type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Primitive(p) if p.unit == Unit::None => "number",
            Value::Primitive(_) => "dimension",
            Value::Color(_) => "color",
            Value::Keyword(_) => "keyword",
            Value::String(_) => "string",
        }
    }

    /// The textual form of this value.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Primitive(p) => p.fmt(f),
            Value::Color(c) => c.fmt(f),
            Value::Keyword(k) => k.fmt(f),
            Value::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Value::Keyword(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::from_name("space-between"), Some(Keyword::SpaceBetween));
        assert_eq!(Keyword::from_name("AUTO"), Some(Keyword::Auto));
        assert_eq!(Keyword::from_name("bogus"), None);
        assert_eq!(Keyword::InlineBlock.name(), "inline-block");
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Value::px(4.0).to_text(), "4px");
        assert_eq!(Value::Color(Color::rgb(0, 0, 255)).to_text(), "#0000ff");
        assert_eq!(Value::Keyword(Keyword::Auto).to_text(), "auto");
        assert_eq!(Value::String("a \"b\"".into()).to_text(), "\"a \\\"b\\\"\"");
    }
}
