use std::fmt;

/// Unit attached to a numeric value.
///
/// The lexer matches suffixes against [`Unit::SUFFIXES`]; everything without
/// a recognized suffix is [`Unit::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    /// Plain number.
    #[default]
    None,
    /// Pixels.
    Px,
    /// Percentage of the parent's dimension.
    Percent,
    /// Character widths.
    Ch,
    /// Centimeters.
    Cm,
    /// Percentage of viewport width.
    Vw,
    /// Percentage of viewport height.
    Vh,
    /// Angle in degrees.
    Deg,
    /// Angle in radians.
    Rad,
}

impl Unit {
    /// Suffix table, longest suffixes first so prefix matching is greedy.
    pub const SUFFIXES: [(&'static str, Unit); 8] = [
        ("deg", Unit::Deg),
        ("rad", Unit::Rad),
        ("px", Unit::Px),
        ("ch", Unit::Ch),
        ("cm", Unit::Cm),
        ("vw", Unit::Vw),
        ("vh", Unit::Vh),
        ("%", Unit::Percent),
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Px => "px",
            Unit::Percent => "%",
            Unit::Ch => "ch",
            Unit::Cm => "cm",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
            Unit::Deg => "deg",
            Unit::Rad => "rad",
        }
    }

    /// True for units that describe a length.
    pub fn is_length(self) -> bool {
        matches!(
            self,
            Unit::Px | Unit::Percent | Unit::Ch | Unit::Cm | Unit::Vw | Unit::Vh
        )
    }

    pub fn is_angle(self) -> bool {
        matches!(self, Unit::Deg | Unit::Rad)
    }

    /// The unit of `self + other`, if the two can be combined.
    ///
    /// A unitless operand adopts the other operand's unit.
    pub fn unify(self, other: Unit) -> Option<Unit> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Unit::None, b) => Some(b),
            (a, Unit::None) => Some(a),
            _ => None,
        }
    }
}

/// A number with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Primitive {
    pub value: f32,
    pub unit: Unit,
}

impl Primitive {
    pub const ZERO: Self = Self {
        value: 0.0,
        unit: Unit::None,
    };

    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub const fn number(value: f32) -> Self {
        Self::new(value, Unit::None)
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, Unit::Px)
    }

    pub const fn percent(value: f32) -> Self {
        Self::new(value, Unit::Percent)
    }

    /// Returns the value in radians when this is an angle, or the raw number
    /// when it has no unit.
    pub fn radians(&self) -> Option<f32> {
        match self.unit {
            Unit::Deg => Some(self.value.to_radians()),
            Unit::Rad | Unit::None => Some(self.value),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify() {
        assert_eq!(Unit::Px.unify(Unit::Px), Some(Unit::Px));
        assert_eq!(Unit::None.unify(Unit::Percent), Some(Unit::Percent));
        assert_eq!(Unit::Px.unify(Unit::None), Some(Unit::Px));
        assert_eq!(Unit::Px.unify(Unit::Percent), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Primitive::px(4.0).to_string(), "4px");
        assert_eq!(Primitive::percent(12.5).to_string(), "12.5%");
        assert_eq!(Primitive::number(-3.0).to_string(), "-3");
    }
}
