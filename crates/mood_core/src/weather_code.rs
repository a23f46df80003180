//! WMO weather interpretation codes as reported by forecast providers.

use crate::mood::Condition;

/// Maps a numeric weather code onto one of the eight mood conditions.
/// Codes outside the WMO table fall back to [`Condition::Cloudy`].
pub fn condition_from_code(code: u16) -> Condition {
    match code {
        0 => Condition::Clear,
        1 | 2 => Condition::PartlyCloudy,
        3 => Condition::Cloudy,
        45 | 48 => Condition::Fog,
        51 | 53 | 55 | 56 | 57 => Condition::Drizzle,
        61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => Condition::Rain,
        71 | 73 | 75 | 77 | 85 | 86 => Condition::Snow,
        95 | 96 | 99 => Condition::Thunder,
        _ => Condition::Cloudy,
    }
}

/// Short human-readable description of a weather code.
pub fn summary_from_code(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Freezing drizzle",
        61 => "Light rain",
        63 => "Rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Freezing rain",
        71 => "Light snowfall",
        73 => "Snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 => "Light rain showers",
        81 => "Rain showers",
        82 => "Violent rain showers",
        85 => "Light snow showers",
        86 => "Snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with light hail",
        99 => "Thunderstorm with hail",
        _ => "Unknown conditions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_buckets() {
        let cases: &[(&[u16], Condition)] = &[
            (&[0], Condition::Clear),
            (&[1, 2], Condition::PartlyCloudy),
            (&[3], Condition::Cloudy),
            (&[45, 48], Condition::Fog),
            (&[51, 53, 55, 56, 57], Condition::Drizzle),
            (&[61, 63, 65, 66, 67, 80, 81, 82], Condition::Rain),
            (&[71, 73, 75, 77, 85, 86], Condition::Snow),
            (&[95, 96, 99], Condition::Thunder),
        ];
        for (codes, expected) in cases {
            for &code in *codes {
                assert_eq!(condition_from_code(code), *expected, "code {code}");
            }
        }
    }

    #[test]
    fn test_unknown_code_is_cloudy() {
        for code in [4, 44, 50, 100, 999] {
            assert_eq!(condition_from_code(code), Condition::Cloudy);
            assert_eq!(summary_from_code(code), "Unknown conditions");
        }
    }
}
