use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Location shown when the poster's position is unknown.
pub const UNKNOWN_LOCATION: &str = "somewhere in the world";

static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d{1,3}(?:\.\d+)?)\s*,\s*(-?\d{1,3}(?:\.\d+)?)\s*$")
        .expect("coordinate pattern should compile")
});

/// A message on the board. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    /// Creation instant in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub location: String,
}

impl Message {
    /// Elapsed milliseconds between creation and `now`. Negative for records
    /// written by a writer whose clock runs ahead.
    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }
}

/// Coarse, human readable position attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location(String);

impl Location {
    pub fn unknown() -> Self {
        Self(UNKNOWN_LOCATION.to_string())
    }

    /// Formats a coordinate pair with four decimals, e.g. `"48.8566, 2.3522"`.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self(format!("{latitude:.4}, {longitude:.4}"))
    }

    /// Normalizes an optional, best-effort hint.
    ///
    /// Blank or missing hints become [`UNKNOWN_LOCATION`]. Hints that look like
    /// a `lat, lon` pair within valid ranges are re-rounded to four decimals;
    /// anything else is kept as trimmed free text.
    pub fn from_hint(hint: Option<&str>) -> Self {
        let Some(hint) = hint.map(str::trim).filter(|hint| !hint.is_empty()) else {
            return Self::unknown();
        };

        if let Some(captures) = COORDINATES.captures(hint) {
            let latitude = captures[1].parse::<f64>().ok();
            let longitude = captures[2].parse::<f64>().ok();
            if let (Some(lat), Some(lon)) = (latitude, longitude) {
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
                    return Self::from_coordinates(lat, lon);
                }
            }
        }

        Self(hint.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_hint_falls_back_to_sentinel() {
        assert_eq!(Location::from_hint(None).as_str(), UNKNOWN_LOCATION);
        assert_eq!(Location::from_hint(Some("   ")).as_str(), UNKNOWN_LOCATION);
    }

    #[test]
    fn coordinate_hint_is_rounded_to_four_decimals() {
        let location = Location::from_hint(Some(" 48.856613 ,2.352222 "));
        assert_eq!(location.as_str(), "48.8566, 2.3522");

        let location = Location::from_hint(Some("-33.9, 151"));
        assert_eq!(location.as_str(), "-33.9000, 151.0000");
    }

    #[test]
    fn out_of_range_coordinates_are_kept_as_text() {
        let location = Location::from_hint(Some("123.0, 10.0"));
        assert_eq!(location.as_str(), "123.0, 10.0");
    }

    #[test]
    fn free_text_hint_is_trimmed() {
        assert_eq!(Location::from_hint(Some("  Lisbon ")).as_str(), "Lisbon");
    }

    #[test]
    fn age_is_relative_to_now() {
        let message = Message {
            id: "a".into(),
            text: "hi".into(),
            timestamp: 1_000,
            location: UNKNOWN_LOCATION.into(),
        };
        assert_eq!(message.age(1_500), 500);
        assert_eq!(message.age(900), -100);
    }
}
