//! User palette preference and the fixed palettes it can select.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Palette;
use crate::error::MoodError;
use crate::mood::Mood;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteChoice {
    /// Follow the computed mood.
    #[default]
    Auto,
    Warm,
    Cool,
    Neutral,
    Crazy,
    Pastel,
}

impl PaletteChoice {
    pub const ALL: [PaletteChoice; 6] = [
        PaletteChoice::Auto,
        PaletteChoice::Warm,
        PaletteChoice::Cool,
        PaletteChoice::Neutral,
        PaletteChoice::Crazy,
        PaletteChoice::Pastel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaletteChoice::Auto => "auto",
            PaletteChoice::Warm => "warm",
            PaletteChoice::Cool => "cool",
            PaletteChoice::Neutral => "neutral",
            PaletteChoice::Crazy => "crazy",
            PaletteChoice::Pastel => "pastel",
        }
    }

    /// Fixed colors for this choice; `None` for `Auto`.
    pub fn fixed_palette(self) -> Option<Palette> {
        match self {
            PaletteChoice::Auto => None,
            PaletteChoice::Warm => Some(Palette::new(0xf97316, 0xfdba74, 0xfde047, 0x0b132b)),
            PaletteChoice::Cool => Some(Palette::new(0x0ea5e9, 0x6366f1, 0x22d3ee, 0xe5e7eb)),
            PaletteChoice::Neutral => Some(Palette::new(0x1f2937, 0x111827, 0x9ca3af, 0xe5e7eb)),
            PaletteChoice::Crazy => Some(Palette::new(0xf472b6, 0xa78bfa, 0x22d3ee, 0x0b132b)),
            PaletteChoice::Pastel => Some(Palette::new(0xfde68a, 0xa7f3d0, 0x93c5fd, 0x0b132b)),
        }
    }
}

impl fmt::Display for PaletteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaletteChoice {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PaletteChoice::ALL
            .into_iter()
            .find(|choice| choice.as_str() == wanted)
            .ok_or_else(|| MoodError::UnknownPalette(s.to_string()))
    }
}

/// Layers a user choice over a computed mood. Colors are swapped for the
/// fixed palette; the metadata stays and the choice is appended to the name.
pub fn apply_override(mood: Mood, choice: PaletteChoice) -> Mood {
    match choice.fixed_palette() {
        None => mood,
        Some(colors) => Mood {
            name: format!("{} • {choice}", mood.name),
            colors,
            meta: mood.meta,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::{Condition, compute_mood};
    use chrono::NaiveDate;

    fn summer_afternoon(latitude: f64) -> Mood {
        let at = NaiveDate::from_ymd_opt(2024, 7, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        compute_mood(Condition::Clear, true, at, latitude)
    }

    #[test]
    fn test_auto_is_identity() {
        let mood = summer_afternoon(45.0);
        assert_eq!(apply_override(mood.clone(), PaletteChoice::Auto), mood);
    }

    #[test]
    fn test_warm_replaces_colors_keeps_meta() {
        let mood = summer_afternoon(45.0);
        let warm = apply_override(mood.clone(), PaletteChoice::Warm);
        assert_eq!(warm.colors, PaletteChoice::Warm.fixed_palette().unwrap());
        assert_eq!(warm.meta, mood.meta);
        assert_eq!(warm.name, "clear • afternoon • summer • warm");
    }

    #[test]
    fn test_crazy_ignores_inputs() {
        for latitude in [45.0, -45.0] {
            let crazy = apply_override(summer_afternoon(latitude), PaletteChoice::Crazy);
            assert_eq!(crazy.colors.bg1.to_string(), "#f472b6");
            assert_eq!(crazy.colors.bg2.to_string(), "#a78bfa");
            assert_eq!(crazy.colors.accent.to_string(), "#22d3ee");
            assert_eq!(crazy.colors.text.to_string(), "#0b132b");
        }
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!("pastel".parse::<PaletteChoice>().unwrap(), PaletteChoice::Pastel);
        assert_eq!(" Cool ".parse::<PaletteChoice>().unwrap(), PaletteChoice::Cool);
        assert_eq!(
            "neon".parse::<PaletteChoice>(),
            Err(MoodError::UnknownPalette("neon".to_string()))
        );
    }

    #[test]
    fn test_choice_serialization() {
        for choice in PaletteChoice::ALL {
            let json = serde_json::to_string(&choice).unwrap();
            assert_eq!(json, format!("\"{choice}\""));
            let back: PaletteChoice = serde_json::from_str(&json).unwrap();
            assert_eq!(back, choice);
        }
    }
}
