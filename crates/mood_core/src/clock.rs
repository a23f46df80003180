use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How the wall clock is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockFace {
    pub hour12: bool,
    pub with_seconds: bool,
}

impl Default for ClockFace {
    fn default() -> Self {
        Self {
            hour12: false,
            with_seconds: true,
        }
    }
}

/// Formatted clock, ready for a view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    pub time: String,
    pub date: String,
    pub timezone: String,
}

impl ClockFace {
    pub fn read(&self, now: NaiveDateTime, timezone: &str) -> ClockReading {
        let pattern = match (self.hour12, self.with_seconds) {
            (false, true) => "%H:%M:%S",
            (false, false) => "%H:%M",
            (true, true) => "%I:%M:%S %p",
            (true, false) => "%I:%M %p",
        };
        ClockReading {
            time: now.format(pattern).to_string(),
            date: now.format("%a, %d %b %Y").to_string(),
            timezone: timezone.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(19, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_24_hour_with_seconds() {
        let reading = ClockFace::default().read(evening(), "UTC");
        assert_eq!(reading.time, "19:05:07");
        assert_eq!(reading.date, "Sat, 09 Mar 2024");
        assert_eq!(reading.timezone, "UTC");
    }

    #[test]
    fn test_12_hour_without_seconds() {
        let face = ClockFace {
            hour12: true,
            with_seconds: false,
        };
        assert_eq!(face.read(evening(), "UTC").time, "07:05 PM");
    }
}
