//! Color helpers for probability feedback.
//!
//! Widgets are painted on a red→green scale: the probability that a
//! configuration one step away still yields a valid document, mapped
//! through [`gradient`].

use std::fmt;

/// Failure end of the probability scale.
pub const RED: Rgb = Rgb { r: 0xff, g: 0x20, b: 0x20 };
/// Success end of the probability scale.
pub const GREEN: Rgb = Rgb { r: 0x20, g: 0xff, b: 0x20 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the last six hex digits of `s` (`"#a0b1c2"`, `"a0b1c2"`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s.get(s.len().checked_sub(6)?..)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Linear interpolation between `start` and `end`, `perc` in `[0, 100]`.
///
/// Values outside the range (or NaN, from a missing probability) are
/// clamped so every channel stays between the two endpoints.
pub fn gradient(perc: f64, start: Rgb, end: Rgb) -> Rgb {
    let perc = if perc.is_nan() { 0.0 } else { perc.clamp(0.0, 100.0) };
    let mix = |a: u8, b: u8| -> u8 {
        let a = a as f64;
        let b = b as f64;
        // Math.round semantics: halves go up
        (a + (b - a) * perc / 100.0 + 0.5).floor().clamp(0.0, 255.0) as u8
    };
    Rgb {
        r: mix(start.r, end.r),
        g: mix(start.g, end.g),
        b: mix(start.b, end.b),
    }
}

/// String form of [`gradient`], for colors coming from markup.
pub fn gradient_hex(perc: f64, start: &str, end: &str) -> Option<String> {
    Some(gradient(perc, Rgb::parse(start)?, Rgb::parse(end)?).to_hex())
}

/// Color of an option whose predicted probability is `proba` (`0.0..=1.0`).
pub fn probability_color(proba: f64) -> Rgb {
    gradient(proba * 100.0, RED, GREEN)
}
