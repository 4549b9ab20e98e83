//! BRG565 pixel color
//!
//! The display packs a pixel into 16 bits as `BBBBB RRRRR GGGGGG`
//! (blue in the top five bits, then red, then six bits of green).
//! This is not the usual RGB565 layout and must be kept bit-for-bit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A packed BRG565 color value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u16);

impl Color {
    pub const RED: Color = Color(0x07C0);
    pub const GREEN: Color = Color(0x001F);
    pub const BLUE: Color = Color(0xF800);
    pub const WHITE: Color = Color(0xFFFF);
    pub const BLACK: Color = Color(0x0000);
    pub const YELLOW: Color = Color(0x07FF);
    pub const CYAN: Color = Color(0xF81F);
    pub const MAGENTA: Color = Color(0xFFE0);

    /// Named colors accepted by `from_str`
    pub const NAMED: [(&'static str, Color); 8] = [
        ("red", Color::RED),
        ("green", Color::GREEN),
        ("blue", Color::BLUE),
        ("white", Color::WHITE),
        ("black", Color::BLACK),
        ("yellow", Color::YELLOW),
        ("cyan", Color::CYAN),
        ("magenta", Color::MAGENTA),
    ];

    /// Convert an RGB888 triple to BRG565
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r5 = (r >> 3) as u16 & 0x1F;
        let g6 = (g >> 2) as u16 & 0x3F;
        let b5 = (b >> 3) as u16 & 0x1F;
        Color((b5 << 11) | (r5 << 6) | g6)
    }

    /// Raw packed value
    pub const fn value(self) -> u16 {
        self.0
    }

    /// The two bytes a pixel occupies in the framebuffer and in a bitmap
    /// payload (high byte first)
    pub const fn to_wire_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<u16> for Color {
    fn from(value: u16) -> Self {
        Color(value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMED.iter().find(|(_, c)| c == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

/// Error returned when a color string cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown color '{0}'")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts a color name, `#RRGGBB`, or a raw `0xNNNN` BRG565 value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((_, color)) = Self::NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
        {
            return Ok(*color);
        }

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() == 6 {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                    return Ok(Color::from_rgb(r, g, b));
                }
            }
        }

        if let Some(raw) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if let Ok(value) = u16::from_str_radix(raw, 16) {
                return Ok(Color(value));
            }
        }

        Err(ParseColorError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
