//! The fixed style property catalog and sparse property sets.
//!
//! Every key a stylesheet can set is a [`PropertyKey`]. Each key declares the
//! [`ValueKind`] it accepts and a default used when no rule sets it. A
//! [`PropertySet`] stores only explicitly set entries, each with an
//! `!important` flag.
//!
//! ```
//! use chimera::properties::{PropertyKey, PropertySet};
//! use chimera::types::Value;
//!
//! let mut set = PropertySet::new();
//! set.set(PropertyKey::PaddingLeft, Value::px(4.0)).unwrap();
//!
//! assert_eq!(set.get(PropertyKey::PaddingLeft), Some(&Value::px(4.0)));
//! assert_eq!(set.computed(PropertyKey::PaddingRight), Value::px(0.0));
//! assert!(set.set(PropertyKey::Color, Value::px(1.0)).is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use phf::phf_map;

use crate::error::ChimeraError;
use crate::types::{Keyword, Unit, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    // Colors
    Color,
    BackgroundColor,
    BorderColor,
    OutlineColor,

    // Text
    Bold,
    Italic,
    Underlined,
    Strikethrough,
    Obfuscated,
    TextShadow,
    FontSize,

    // Box
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    OutlineTopWidth,
    OutlineRightWidth,
    OutlineBottomWidth,
    OutlineLeftWidth,
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    BoxSizing,

    // Layout
    Display,
    FlexDirection,
    FlexWrap,
    JustifyContent,
    AlignItems,
    AlignSelf,
    Order,
    ZIndex,
    Visibility,
    Scale,
}

static PROPERTIES: phf::Map<&'static str, PropertyKey> = phf_map! {
    "color" => PropertyKey::Color,
    "background-color" => PropertyKey::BackgroundColor,
    "border-color" => PropertyKey::BorderColor,
    "outline-color" => PropertyKey::OutlineColor,
    "bold" => PropertyKey::Bold,
    "italic" => PropertyKey::Italic,
    "underlined" => PropertyKey::Underlined,
    "strikethrough" => PropertyKey::Strikethrough,
    "obfuscated" => PropertyKey::Obfuscated,
    "text-shadow" => PropertyKey::TextShadow,
    "font-size" => PropertyKey::FontSize,
    "padding-top" => PropertyKey::PaddingTop,
    "padding-right" => PropertyKey::PaddingRight,
    "padding-bottom" => PropertyKey::PaddingBottom,
    "padding-left" => PropertyKey::PaddingLeft,
    "margin-top" => PropertyKey::MarginTop,
    "margin-right" => PropertyKey::MarginRight,
    "margin-bottom" => PropertyKey::MarginBottom,
    "margin-left" => PropertyKey::MarginLeft,
    "border-top-width" => PropertyKey::BorderTopWidth,
    "border-right-width" => PropertyKey::BorderRightWidth,
    "border-bottom-width" => PropertyKey::BorderBottomWidth,
    "border-left-width" => PropertyKey::BorderLeftWidth,
    "outline-top-width" => PropertyKey::OutlineTopWidth,
    "outline-right-width" => PropertyKey::OutlineRightWidth,
    "outline-bottom-width" => PropertyKey::OutlineBottomWidth,
    "outline-left-width" => PropertyKey::OutlineLeftWidth,
    "width" => PropertyKey::Width,
    "height" => PropertyKey::Height,
    "min-width" => PropertyKey::MinWidth,
    "min-height" => PropertyKey::MinHeight,
    "max-width" => PropertyKey::MaxWidth,
    "max-height" => PropertyKey::MaxHeight,
    "box-sizing" => PropertyKey::BoxSizing,
    "display" => PropertyKey::Display,
    "flex-direction" => PropertyKey::FlexDirection,
    "flex-wrap" => PropertyKey::FlexWrap,
    "justify-content" => PropertyKey::JustifyContent,
    "align-items" => PropertyKey::AlignItems,
    "align-self" => PropertyKey::AlignSelf,
    "order" => PropertyKey::Order,
    "z-index" => PropertyKey::ZIndex,
    "visibility" => PropertyKey::Visibility,
    "scale" => PropertyKey::Scale,
};

/// What values a property accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    /// `true` / `false`
    Flag,
    /// A length or a plain number.
    Length,
    /// A length, or the given keyword.
    LengthOr(Keyword),
    Number,
    Keywords(&'static [Keyword]),
}

impl ValueKind {
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Color, Value::Color(_)) => true,
            (ValueKind::Flag, Value::Keyword(k)) => matches!(k, Keyword::True | Keyword::False),
            (ValueKind::Length | ValueKind::LengthOr(_), Value::Primitive(p)) => {
                p.unit == Unit::None || p.unit.is_length()
            }
            (ValueKind::LengthOr(allowed), Value::Keyword(k)) => *k == allowed,
            (ValueKind::Number, Value::Primitive(p)) => p.unit == Unit::None,
            (ValueKind::Keywords(allowed), Value::Keyword(k)) => allowed.contains(k),
            _ => false,
        }
    }
}

const DISPLAY: &[Keyword] = &[
    Keyword::None,
    Keyword::Block,
    Keyword::Inline,
    Keyword::InlineBlock,
    Keyword::Flex,
];
const FLEX_DIRECTION: &[Keyword] = &[
    Keyword::Row,
    Keyword::Column,
    Keyword::RowReverse,
    Keyword::ColumnReverse,
];
const FLEX_WRAP: &[Keyword] = &[Keyword::Wrap, Keyword::Nowrap];
const JUSTIFY: &[Keyword] = &[
    Keyword::Start,
    Keyword::End,
    Keyword::Center,
    Keyword::SpaceBetween,
    Keyword::SpaceAround,
];
const ALIGN: &[Keyword] = &[
    Keyword::Auto,
    Keyword::Start,
    Keyword::End,
    Keyword::Center,
    Keyword::Stretch,
    Keyword::Baseline,
];
const VISIBILITY: &[Keyword] = &[Keyword::Visible, Keyword::Hidden];
const BOX_SIZING: &[Keyword] = &[Keyword::BorderBox, Keyword::ContentBox];

impl PropertyKey {
    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTIES.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Color => "color",
            PropertyKey::BackgroundColor => "background-color",
            PropertyKey::BorderColor => "border-color",
            PropertyKey::OutlineColor => "outline-color",
            PropertyKey::Bold => "bold",
            PropertyKey::Italic => "italic",
            PropertyKey::Underlined => "underlined",
            PropertyKey::Strikethrough => "strikethrough",
            PropertyKey::Obfuscated => "obfuscated",
            PropertyKey::TextShadow => "text-shadow",
            PropertyKey::FontSize => "font-size",
            PropertyKey::PaddingTop => "padding-top",
            PropertyKey::PaddingRight => "padding-right",
            PropertyKey::PaddingBottom => "padding-bottom",
            PropertyKey::PaddingLeft => "padding-left",
            PropertyKey::MarginTop => "margin-top",
            PropertyKey::MarginRight => "margin-right",
            PropertyKey::MarginBottom => "margin-bottom",
            PropertyKey::MarginLeft => "margin-left",
            PropertyKey::BorderTopWidth => "border-top-width",
            PropertyKey::BorderRightWidth => "border-right-width",
            PropertyKey::BorderBottomWidth => "border-bottom-width",
            PropertyKey::BorderLeftWidth => "border-left-width",
            PropertyKey::OutlineTopWidth => "outline-top-width",
            PropertyKey::OutlineRightWidth => "outline-right-width",
            PropertyKey::OutlineBottomWidth => "outline-bottom-width",
            PropertyKey::OutlineLeftWidth => "outline-left-width",
            PropertyKey::Width => "width",
            PropertyKey::Height => "height",
            PropertyKey::MinWidth => "min-width",
            PropertyKey::MinHeight => "min-height",
            PropertyKey::MaxWidth => "max-width",
            PropertyKey::MaxHeight => "max-height",
            PropertyKey::BoxSizing => "box-sizing",
            PropertyKey::Display => "display",
            PropertyKey::FlexDirection => "flex-direction",
            PropertyKey::FlexWrap => "flex-wrap",
            PropertyKey::JustifyContent => "justify-content",
            PropertyKey::AlignItems => "align-items",
            PropertyKey::AlignSelf => "align-self",
            PropertyKey::Order => "order",
            PropertyKey::ZIndex => "z-index",
            PropertyKey::Visibility => "visibility",
            PropertyKey::Scale => "scale",
        }
    }

    pub fn kind(self) -> ValueKind {
        use PropertyKey::*;
        match self {
            Color | BackgroundColor | BorderColor | OutlineColor => ValueKind::Color,
            Bold | Italic | Underlined | Strikethrough | Obfuscated | TextShadow => ValueKind::Flag,
            FontSize | PaddingTop | PaddingRight | PaddingBottom | PaddingLeft | MarginTop
            | MarginRight | MarginBottom | MarginLeft | BorderTopWidth | BorderRightWidth
            | BorderBottomWidth | BorderLeftWidth | OutlineTopWidth | OutlineRightWidth
            | OutlineBottomWidth | OutlineLeftWidth => ValueKind::Length,
            Width | Height | MinWidth | MinHeight => ValueKind::LengthOr(Keyword::Auto),
            MaxWidth | MaxHeight => ValueKind::LengthOr(Keyword::None),
            BoxSizing => ValueKind::Keywords(BOX_SIZING),
            Display => ValueKind::Keywords(DISPLAY),
            FlexDirection => ValueKind::Keywords(FLEX_DIRECTION),
            FlexWrap => ValueKind::Keywords(FLEX_WRAP),
            JustifyContent => ValueKind::Keywords(JUSTIFY),
            AlignItems | AlignSelf => ValueKind::Keywords(ALIGN),
            Order | ZIndex | Scale => ValueKind::Number,
            Visibility => ValueKind::Keywords(VISIBILITY),
        }
    }

    /// The value in effect when no rule sets this property.
    pub fn default_value(self) -> Value {
        use PropertyKey::*;
        match self {
            Color => Value::Color(crate::types::Color::WHITE),
            BackgroundColor | BorderColor | OutlineColor => {
                Value::Color(crate::types::Color::TRANSPARENT)
            }
            Bold | Italic | Underlined | Strikethrough | Obfuscated | TextShadow => {
                Value::Keyword(Keyword::False)
            }
            FontSize | Scale => Value::number(1.0),
            PaddingTop | PaddingRight | PaddingBottom | PaddingLeft | MarginTop | MarginRight
            | MarginBottom | MarginLeft | BorderTopWidth | BorderRightWidth | BorderBottomWidth
            | BorderLeftWidth | OutlineTopWidth | OutlineRightWidth | OutlineBottomWidth
            | OutlineLeftWidth => Value::px(0.0),
            Width | Height | MinWidth | MinHeight => Value::Keyword(Keyword::Auto),
            MaxWidth | MaxHeight => Value::Keyword(Keyword::None),
            BoxSizing => Value::Keyword(Keyword::BorderBox),
            Display => Value::Keyword(Keyword::Block),
            FlexDirection => Value::Keyword(Keyword::Row),
            FlexWrap => Value::Keyword(Keyword::Nowrap),
            JustifyContent => Value::Keyword(Keyword::Start),
            AlignItems => Value::Keyword(Keyword::Stretch),
            AlignSelf => Value::Keyword(Keyword::Auto),
            Order | ZIndex => Value::number(0.0),
            Visibility => Value::Keyword(Keyword::Visible),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Properties that expand into four edge longhands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shorthand {
    Padding,
    Margin,
    BorderWidth,
    OutlineWidth,
}

impl Shorthand {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "padding" => Some(Shorthand::Padding),
            "margin" => Some(Shorthand::Margin),
            "border-width" => Some(Shorthand::BorderWidth),
            "outline-width" => Some(Shorthand::OutlineWidth),
            _ => None,
        }
    }

    /// Top, right, bottom, left.
    pub fn longhands(self) -> [PropertyKey; 4] {
        use PropertyKey::*;
        match self {
            Shorthand::Padding => [PaddingTop, PaddingRight, PaddingBottom, PaddingLeft],
            Shorthand::Margin => [MarginTop, MarginRight, MarginBottom, MarginLeft],
            Shorthand::BorderWidth => [
                BorderTopWidth,
                BorderRightWidth,
                BorderBottomWidth,
                BorderLeftWidth,
            ],
            Shorthand::OutlineWidth => [
                OutlineTopWidth,
                OutlineRightWidth,
                OutlineBottomWidth,
                OutlineLeftWidth,
            ],
        }
    }

    /// Spreads 1-4 values over the edges in CSS order.
    pub fn expand(self, values: &[Value]) -> Option<[(PropertyKey, Value); 4]> {
        let [top, right, bottom, left] = match values {
            [all] => [all, all, all, all],
            [vertical, horizontal] => [vertical, horizontal, vertical, horizontal],
            [top, horizontal, bottom] => [top, horizontal, bottom, horizontal],
            [top, right, bottom, left] => [top, right, bottom, left],
            _ => return None,
        };
        let [t, r, b, l] = self.longhands();
        Some([
            (t, top.clone()),
            (r, right.clone()),
            (b, bottom.clone()),
            (l, left.clone()),
        ])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyEntry {
    pub value: Value,
    pub important: bool,
}

/// Sparse mapping from catalog keys to values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertySet {
    entries: BTreeMap<PropertyKey, PropertyEntry>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: PropertyKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn get(&self, key: PropertyKey) -> Option<&Value> {
        self.entries.get(&key).map(|e| &e.value)
    }

    pub fn entry(&self, key: PropertyKey) -> Option<&PropertyEntry> {
        self.entries.get(&key)
    }

    /// The set value, or the key's default.
    pub fn computed(&self, key: PropertyKey) -> Value {
        self.get(key).cloned().unwrap_or_else(|| key.default_value())
    }

    /// Sets a value after checking it against the key's [`ValueKind`].
    pub fn set(&mut self, key: PropertyKey, value: Value) -> Result<(), ChimeraError> {
        self.set_entry(key, value, false)
    }

    pub fn set_important(&mut self, key: PropertyKey, value: Value) -> Result<(), ChimeraError> {
        self.set_entry(key, value, true)
    }

    fn set_entry(&mut self, key: PropertyKey, value: Value, important: bool) -> Result<(), ChimeraError> {
        if !key.kind().accepts(&value) {
            return Err(ChimeraError::InvalidValue {
                property: key.name().to_string(),
                value: value.to_text(),
            });
        }
        self.entries.insert(key, PropertyEntry { value, important });
        Ok(())
    }

    /// Sets a property or shorthand by name.
    ///
    /// A shorthand takes 1-4 values; every other property exactly one.
    pub fn set_named(&mut self, name: &str, values: &[Value], important: bool) -> Result<(), ChimeraError> {
        if let Some(shorthand) = Shorthand::from_name(name) {
            let expanded = shorthand.expand(values).ok_or_else(|| ChimeraError::InvalidValue {
                property: name.to_string(),
                value: join_text(values),
            })?;
            // Validate all edges before touching the set
            if let Some((key, value)) = expanded.iter().find(|(k, v)| !k.kind().accepts(v)) {
                return Err(ChimeraError::InvalidValue {
                    property: key.name().to_string(),
                    value: value.to_text(),
                });
            }
            for (key, value) in expanded {
                self.entries.insert(key, PropertyEntry { value, important });
            }
            return Ok(());
        }

        let key = PropertyKey::from_name(name)
            .ok_or_else(|| ChimeraError::UnknownProperty(name.to_string()))?;
        match values {
            [value] => self.set_entry(key, value.clone(), important),
            _ => Err(ChimeraError::InvalidValue {
                property: name.to_string(),
                value: join_text(values),
            }),
        }
    }

    pub fn remove(&mut self, key: PropertyKey) -> Option<Value> {
        self.entries.remove(&key).map(|e| e.value)
    }

    /// Cascade merge: entries of `other` win key by key, except that an
    /// important entry is only replaced by another important one.
    pub fn merge(&mut self, other: &PropertySet) {
        for (key, incoming) in &other.entries {
            match self.entries.get(key) {
                Some(existing) if existing.important && !incoming.important => {}
                _ => {
                    self.entries.insert(*key, incoming.clone());
                }
            }
        }
    }

    /// Copies every entry of `other` over this set, ignoring importance.
    pub fn overlay(&mut self, other: &PropertySet) {
        for (key, entry) in &other.entries {
            self.entries.insert(*key, entry.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &Value)> {
        self.entries.iter().map(|(k, e)| (*k, &e.value))
    }

    pub fn entries(&self) -> impl Iterator<Item = (PropertyKey, &PropertyEntry)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }
}

fn join_text(values: &[Value]) -> String {
    values.iter().map(Value::to_text).collect::<Vec<_>>().join(" ")
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, entry)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {}", key, entry.value)?;
            if entry.important {
                f.write_str(" !important")?;
            }
            f.write_str(";")?;
        }
        Ok(())
    }
}
