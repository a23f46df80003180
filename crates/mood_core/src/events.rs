//! Defines the signals that can change the ambient state.

use chrono::NaiveDateTime;

use crate::mood::Condition;
use crate::palette::PaletteChoice;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Wall-clock tick carrying local time.
    Tick { now: NaiveDateTime },
    Weather { condition: Condition, is_day: bool },
    Location { latitude: f64, longitude: f64 },
    Palette { choice: PaletteChoice },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json;

    #[test]
    fn test_event_tick_serialization() {
        let now = NaiveDate::from_ymd_opt(2024, 7, 15)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let event = Event::Tick { now };
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_event_weather_wire_format() {
        let event: Event =
            serde_json::from_str(r#"{"type":"weather","condition":"partly-cloudy","is_day":false}"#)
                .unwrap();
        assert_eq!(
            event,
            Event::Weather {
                condition: Condition::PartlyCloudy,
                is_day: false,
            }
        );
    }

    #[test]
    fn test_event_palette_serialization() {
        for choice in PaletteChoice::ALL {
            let event = Event::Palette { choice };
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: Event = serde_json::from_str(&json).unwrap();
            assert_eq!(event, deserialized);
        }
    }
}
