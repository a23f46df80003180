//! Color values shared by the mood model and the renderers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MoodError;

/// 24-bit sRGB color, written as `#rrggbb`.
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

    /// Builds a color from a `0xRRGGBB` literal.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn from_u32(value: u32) -> Self {
        Self::hex(value)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MoodError::InvalidColor(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb::hex)
            .map_err(|_| MoodError::InvalidColor(s.to_string()))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The four colors a mood hands to the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Palette {
    pub bg1: Rgb,
    pub bg2: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
}

impl Palette {
    pub const fn new(bg1: u32, bg2: u32, accent: u32, text: u32) -> Self {
        Self {
            bg1: Rgb::hex(bg1),
            bg2: Rgb::hex(bg2),
            accent: Rgb::hex(accent),
            text: Rgb::hex(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_display_is_lowercase_with_hash() {
        assert_eq!(Rgb::hex(0x0B132B).to_string(), "#0b132b");
    }

    #[test]
    fn test_parse_accepts_with_and_without_hash() {
        assert_eq!("#fde047".parse::<Rgb>().unwrap(), Rgb::new(0xfd, 0xe0, 0x47));
        assert_eq!("FDE047".parse::<Rgb>().unwrap(), Rgb::new(0xfd, 0xe0, 0x47));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("#fde04".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
        assert!("".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_palette_serializes_as_hex_strings() {
        let palette = Palette::new(0xf472b6, 0xa78bfa, 0x22d3ee, 0x0b132b);
        let json = serde_json::to_value(palette).unwrap();
        assert_eq!(json["bg1"], "#f472b6");
        assert_eq!(json["text"], "#0b132b");
        let back: Palette = serde_json::from_value(json).unwrap();
        assert_eq!(back, palette);
    }
}
