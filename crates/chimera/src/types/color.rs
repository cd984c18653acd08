//! RGBA color type with parsing and manipulation.
//!
//! Colors reach a stylesheet in three ways:
//!
//! - **Hex literals**: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`
//! - **Named colors**: `red`, `aliceblue`, `rebeccapurple`, ...
//! - **Constructor functions**: `rgb()`, `rgba()`, `hsl()`, `hsla()`, evaluated
//!   by the function registry
//!
//! ## Color Manipulation
//!
//! `brighten` and `darken` shift the HSL lightness channel:
//!
//! ```
//! use chimera::types::Color;
//!
//! let blue = Color::rgb(0, 0, 255);
//! let lighter = blue.brighten(0.1);
//! assert!(lighter.g > 0);
//! ```

use std::fmt;

use phf::phf_map;
use thiserror::Error;

/// Errors that can occur when parsing a color literal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColorParseError {
    #[error("invalid hex color length: {0}")]
    InvalidLength(usize),

    #[error("invalid hex digit: {0}")]
    InvalidDigit(char),
}

/// An 8-bit-per-channel RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

static NAMED_COLORS: phf::Map<&'static str, Color> = phf_map! {
    "transparent" => Color::rgba(0, 0, 0, 0),
    "black" => Color::rgb(0, 0, 0),
    "white" => Color::rgb(255, 255, 255),
    "red" => Color::rgb(255, 0, 0),
    "green" => Color::rgb(0, 128, 0),
    "lime" => Color::rgb(0, 255, 0),
    "blue" => Color::rgb(0, 0, 255),
    "yellow" => Color::rgb(255, 255, 0),
    "cyan" => Color::rgb(0, 255, 255),
    "aqua" => Color::rgb(0, 255, 255),
    "magenta" => Color::rgb(255, 0, 255),
    "fuchsia" => Color::rgb(255, 0, 255),
    "gray" => Color::rgb(128, 128, 128),
    "grey" => Color::rgb(128, 128, 128),
    "silver" => Color::rgb(192, 192, 192),
    "maroon" => Color::rgb(128, 0, 0),
    "olive" => Color::rgb(128, 128, 0),
    "purple" => Color::rgb(128, 0, 128),
    "teal" => Color::rgb(0, 128, 128),
    "navy" => Color::rgb(0, 0, 128),
    "orange" => Color::rgb(255, 165, 0),
    "aliceblue" => Color::rgb(240, 248, 255),
    "aquamarine" => Color::rgb(127, 255, 212),
    "beige" => Color::rgb(245, 245, 220),
    "brown" => Color::rgb(165, 42, 42),
    "coral" => Color::rgb(255, 127, 80),
    "crimson" => Color::rgb(220, 20, 60),
    "darkblue" => Color::rgb(0, 0, 139),
    "darkgray" => Color::rgb(169, 169, 169),
    "darkgreen" => Color::rgb(0, 100, 0),
    "darkred" => Color::rgb(139, 0, 0),
    "gold" => Color::rgb(255, 215, 0),
    "indigo" => Color::rgb(75, 0, 130),
    "lightblue" => Color::rgb(173, 216, 230),
    "lightgray" => Color::rgb(211, 211, 211),
    "lightgreen" => Color::rgb(144, 238, 144),
    "pink" => Color::rgb(255, 192, 203),
    "rebeccapurple" => Color::rgb(102, 51, 153),
    "salmon" => Color::rgb(250, 128, 114),
    "skyblue" => Color::rgb(135, 206, 235),
    "tomato" => Color::rgb(255, 99, 71),
    "turquoise" => Color::rgb(64, 224, 208),
    "violet" => Color::rgb(238, 130, 238),
    "wheat" => Color::rgb(245, 222, 179),
};

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a color from channel values that may be out of range.
    ///
    /// Channels are rounded and clamped to `0..=255`; alpha is a fraction in
    /// `0.0..=1.0`.
    pub fn from_channels(r: f32, g: f32, b: f32, alpha: f32) -> Self {
        let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::rgba(channel(r), channel(g), channel(b), channel(alpha * 255.0))
    }

    /// Looks up a named color (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Returns a copy of this color with the given alpha fraction.
    pub fn with_alpha(&self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..*self
        }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Parses the digits of a hex color (without the leading `#`).
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8).ok_or(ColorParseError::InvalidDigit(c)))
            .collect::<Result<Vec<u8>, _>>()?;

        match digits.as_slice() {
            // #RGB -> #RRGGBB
            [r, g, b] => Ok(Self::rgb(r * 17, g * 17, b * 17)),
            [r, g, b, a] => Ok(Self::rgba(r * 17, g * 17, b * 17, a * 17)),
            [r1, r2, g1, g2, b1, b2] => Ok(Self::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Ok(Self::rgba(
                r1 * 16 + r2,
                g1 * 16 + g2,
                b1 * 16 + b2,
                a1 * 16 + a2,
            )),
            other => Err(ColorParseError::InvalidLength(other.len())),
        }
    }

    /// Increases HSL lightness by `amount` (a fraction, `0.1` = 10%).
    pub fn brighten(&self, amount: f32) -> Self {
        let (h, s, l) = self.to_hsl();
        Self::from_hsl(h, s, (l + amount).clamp(0.0, 1.0), self.alpha())
    }

    /// Decreases HSL lightness by `amount` (a fraction, `0.1` = 10%).
    pub fn darken(&self, amount: f32) -> Self {
        let (h, s, l) = self.to_hsl();
        Self::from_hsl(h, s, (l - amount).clamp(0.0, 1.0), self.alpha())
    }

    /// Returns `(hue in degrees, saturation, lightness)`.
    pub fn to_hsl(&self) -> (f32, f32, f32) {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, l);
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + (if g < b { 6.0 } else { 0.0 })
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h * 60.0, s, l)
    }

    /// Creates a color from HSL values; hue in degrees, the rest as fractions.
    pub fn from_hsl(h: f32, s: f32, l: f32, alpha: f32) -> Self {
        let h = h.rem_euclid(360.0) / 360.0;
        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                Self::hue_to_rgb(p, q, h + 1.0 / 3.0),
                Self::hue_to_rgb(p, q, h),
                Self::hue_to_rgb(p, q, h - 1.0 / 3.0),
            )
        };

        Self::from_channels(r * 255.0, g * 255.0, b * 255.0, alpha)
    }

    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }

        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_3_digit() {
        assert_eq!(Color::from_hex("f00").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hex("abc").unwrap(), Color::rgb(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_hex_4_and_8_digit() {
        assert_eq!(Color::from_hex("f008").unwrap(), Color::rgba(255, 0, 0, 0x88));
        assert_eq!(
            Color::from_hex("ff000080").unwrap(),
            Color::rgba(255, 0, 0, 0x80)
        );
    }

    #[test]
    fn test_hex_case_insensitive() {
        assert_eq!(
            Color::from_hex("AaBbCc").unwrap(),
            Color::from_hex("aabbcc").unwrap()
        );
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!(Color::from_hex("ff"), Err(ColorParseError::InvalidLength(2)));
        assert_eq!(Color::from_hex("ggg"), Err(ColorParseError::InvalidDigit('g')));
    }

    #[test]
    fn test_named() {
        assert_eq!(Color::named("Red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::named("transparent"), Some(Color::TRANSPARENT));
        assert_eq!(Color::named("notacolor"), None);
    }

    #[test]
    fn test_hsl_roundtrip() {
        let c = Color::from_hsl(0.0, 1.0, 0.5, 1.0);
        assert_eq!(c, Color::rgb(255, 0, 0));
        let (h, s, l) = c.to_hsl();
        assert_eq!((h, s, l), (0.0, 1.0, 0.5));
    }

    #[test]
    fn test_brighten_darken() {
        let gray = Color::rgb(100, 100, 100);
        assert!(gray.brighten(0.2).r > 100);
        assert!(gray.darken(0.2).r < 100);
        assert_eq!(Color::WHITE.brighten(0.5), Color::WHITE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#ff0010");
        assert_eq!(Color::rgba(0, 0, 0, 0x80).to_string(), "#00000080");
    }
}
