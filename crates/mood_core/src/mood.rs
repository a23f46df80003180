//! Mood model: turns weather, time of day, season and hemisphere into a
//! named four-color palette.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::color::{Palette, Rgb};

/// Coarse weather category. Upstream classification guarantees one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Drizzle,
    Rain,
    Thunder,
    Fog,
    Snow,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Clear => "clear",
            Condition::PartlyCloudy => "partly-cloudy",
            Condition::Cloudy => "cloudy",
            Condition::Drizzle => "drizzle",
            Condition::Rain => "rain",
            Condition::Thunder => "thunder",
            Condition::Fog => "fog",
            Condition::Snow => "snow",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    pub fn as_str(self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
            Season::Spring => "spring",
        }
    }

    /// The season half a year away.
    fn opposite(self) -> Self {
        match self {
            Season::Summer => Season::Winter,
            Season::Autumn => Season::Spring,
            Season::Winter => Season::Summer,
            Season::Spring => Season::Autumn,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Dawn,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            DayPeriod::Dawn => "dawn",
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
            DayPeriod::Night => "night",
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodMeta {
    pub season: Season,
    pub period: DayPeriod,
    pub condition: Condition,
    pub is_day: bool,
}

/// Derived palette plus the classification it came from. Replaced wholesale
/// on every recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub name: String,
    pub colors: Palette,
    pub meta: MoodMeta,
}

/// Season from the calendar month. Latitude 0 counts as Northern.
pub fn classify_season(date: &impl Datelike, latitude: f64) -> Season {
    let northern = match date.month() {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Autumn,
    };
    if latitude >= 0.0 {
        northern
    } else {
        northern.opposite()
    }
}

/// Day period from the local wall-clock hour (0-23).
pub fn classify_period(hour: u32) -> DayPeriod {
    match hour {
        5..=6 => DayPeriod::Dawn,
        7..=11 => DayPeriod::Morning,
        12..=17 => DayPeriod::Afternoon,
        18..=21 => DayPeriod::Evening,
        _ => DayPeriod::Night,
    }
}

/// Hand-tuned colors for each condition, by day and by night.
pub fn base_palette(condition: Condition, is_day: bool) -> Palette {
    match (condition, is_day) {
        (Condition::Clear, true) => Palette::new(0x0ea5e9, 0x22d3ee, 0xfde047, 0x0b132b),
        (Condition::Clear, false) => Palette::new(0x0b132b, 0x1b2a41, 0xa78bfa, 0xe5e7eb),
        (Condition::PartlyCloudy, true) => Palette::new(0x60a5fa, 0x22d3ee, 0xf59e0b, 0x0b132b),
        (Condition::PartlyCloudy, false) => Palette::new(0x0f172a, 0x1f2937, 0x93c5fd, 0xe5e7eb),
        (Condition::Cloudy, true) => Palette::new(0x475569, 0x334155, 0xa3e635, 0xe5e7eb),
        (Condition::Cloudy, false) => Palette::new(0x0b0f19, 0x111827, 0x86efac, 0xe5e7eb),
        (Condition::Drizzle, true) => Palette::new(0x7dd3fc, 0x38bdf8, 0xc084fc, 0x0b132b),
        (Condition::Drizzle, false) => Palette::new(0x0ea5e9, 0x164e63, 0xa78bfa, 0xe5e7eb),
        (Condition::Rain, true) => Palette::new(0x0ea5e9, 0x0369a1, 0x67e8f9, 0xe5e7eb),
        (Condition::Rain, false) => Palette::new(0x0b132b, 0x1e3a8a, 0x67e8f9, 0xe5e7eb),
        (Condition::Thunder, true) => Palette::new(0x6d28d9, 0x0ea5e9, 0xfde047, 0xf1f5f9),
        (Condition::Thunder, false) => Palette::new(0x581c87, 0x1e293b, 0xfde047, 0xf1f5f9),
        (Condition::Fog, true) => Palette::new(0x94a3b8, 0x64748b, 0xe2e8f0, 0x0b132b),
        (Condition::Fog, false) => Palette::new(0x334155, 0x1e293b, 0xcbd5e1, 0xe5e7eb),
        (Condition::Snow, true) => Palette::new(0xe2e8f0, 0x94a3b8, 0x60a5fa, 0x0b132b),
        (Condition::Snow, false) => Palette::new(0xcbd5e1, 0x64748b, 0x93c5fd, 0x0b132b),
    }
}

/// Seasonal accent, plus light text once the evening sets in.
pub fn tweak_by_season_period(colors: Palette, season: Season, period: DayPeriod) -> Palette {
    let accent = match season {
        Season::Summer => Rgb::hex(0xfbbf24),
        Season::Autumn => Rgb::hex(0xf97316),
        Season::Winter => Rgb::hex(0x60a5fa),
        Season::Spring => Rgb::hex(0x22c55e),
    };
    let text = match period {
        DayPeriod::Evening | DayPeriod::Night => Rgb::hex(0xe5e7eb),
        _ => colors.text,
    };
    Palette {
        accent,
        text,
        ..colors
    }
}

/// Computes the mood for a moment and place. Pure and cheap; callers can
/// recompute it on every clock tick.
pub fn compute_mood(
    condition: Condition,
    is_day: bool,
    at: NaiveDateTime,
    latitude: f64,
) -> Mood {
    let season = classify_season(&at, latitude);
    let period = classify_period(at.hour());
    let colors = tweak_by_season_period(base_palette(condition, is_day), season, period);

    Mood {
        name: format!("{condition} • {period} • {season}"),
        colors,
        meta: MoodMeta {
            season,
            period,
            condition,
            is_day,
        },
    }
}
