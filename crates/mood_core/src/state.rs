//! Inputs the mood is derived from, and the snapshot shared outwardly.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::clock::ClockReading;
use crate::mood::{Condition, Mood};
use crate::palette::PaletteChoice;

/// Córdoba, AR. Used until a location is known.
pub const DEFAULT_LATITUDE: f64 = -31.4201;
pub const DEFAULT_LONGITUDE: f64 = -64.1888;

/// Defines the current ambient inputs.
///
/// Weather defaults to cloudy until the first report arrives, with day or
/// night taken from the clock hour (day is 07:00 to 18:59).
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientState {
    now: NaiveDateTime,
    condition: Condition,
    is_day: bool,
    weather_known: bool,
    latitude: f64,
    longitude: f64,
    choice: PaletteChoice,
}

/// Ambient state to share outwardly at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSnapshot {
    pub clock: ClockReading,
    pub condition: Condition,
    pub is_day: bool,
    pub weather_known: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub choice: PaletteChoice,
    /// Mood derived from the inputs alone.
    pub computed: Mood,
    /// Mood after the palette choice is applied; this is what renderers use.
    pub mood: Mood,
}

impl AmbientState {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            condition: Condition::Cloudy,
            is_day: assumed_daylight(&now),
            weather_known: false,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            choice: PaletteChoice::Auto,
        }
    }

    // Getters
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn is_day(&self) -> bool {
        self.is_day
    }

    pub fn weather_known(&self) -> bool {
        self.weather_known
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn choice(&self) -> PaletteChoice {
        self.choice
    }

    // Setters
    pub fn set_now(&mut self, now: NaiveDateTime) {
        self.now = now;
        if !self.weather_known {
            self.is_day = assumed_daylight(&now);
        }
    }

    pub fn set_weather(&mut self, condition: Condition, is_day: bool) {
        self.condition = condition;
        self.is_day = is_day;
        self.weather_known = true;
    }

    /// Coordinates are clamped to valid ranges; non-finite values are ignored.
    pub fn set_location(&mut self, latitude: f64, longitude: f64) {
        if latitude.is_finite() {
            self.latitude = latitude.clamp(-90., 90.);
        }
        if longitude.is_finite() {
            self.longitude = longitude.clamp(-180., 180.);
        }
    }

    pub fn set_choice(&mut self, choice: PaletteChoice) {
        self.choice = choice;
    }
}

fn assumed_daylight(now: &NaiveDateTime) -> bool {
    (7..19).contains(&now.hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn noon() -> NaiveDateTime {
        at(12, 0)
    }

    #[test]
    fn test_defaults() {
        let state = AmbientState::new(noon());
        assert_eq!(state.condition(), Condition::Cloudy);
        assert!(state.is_day());
        assert!(!state.weather_known());
        assert_eq!(state.choice(), PaletteChoice::Auto);
        assert_eq!(state.latitude(), DEFAULT_LATITUDE);
    }

    #[test]
    fn test_location_bounds() {
        let mut state = AmbientState::new(noon());
        state.set_location(120.0, -400.0);
        assert_eq!(state.latitude(), 90.0);
        assert_eq!(state.longitude(), -180.0);
        state.set_location(f64::NAN, 12.0);
        assert_eq!(state.latitude(), 90.0);
        assert_eq!(state.longitude(), 12.0);
    }

    #[test]
    fn test_daylight_follows_clock_until_weather_arrives() {
        assert!(!AmbientState::new(at(23, 30)).is_day());
        assert!(!AmbientState::new(at(6, 59)).is_day());
        assert!(AmbientState::new(at(7, 0)).is_day());
        assert!(!AmbientState::new(at(19, 0)).is_day());

        let mut state = AmbientState::new(at(6, 59));
        state.set_now(at(7, 0));
        assert!(state.is_day());

        state.set_weather(Condition::Rain, false);
        state.set_now(at(12, 0));
        assert!(!state.is_day());
    }
}
