//! Timestamp parsing and display shared by request bodies and views.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Format used by list and detail views, e.g. `13 Dec 2024 10:00`.
pub const DISPLAY_FORMAT: &str = "%d %b %Y %H:%M";

/// Naive forms accepted besides RFC 3339; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

pub fn display(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(DISPLAY_FORMAT).to_string()
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 30, 14, 0, 0).unwrap();

        for raw in [
            "2026-03-30 14:00",
            "2026-03-30 14:00:00",
            "2026-03-30T14:00",
            "2026-03-30T14:00:00",
            "2026-03-30T14:00:00Z",
            "2026-03-30T16:00:00+02:00",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "failed to parse {raw}");
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("tomorrow"), None);
        assert_eq!(parse_timestamp("2026-13-30 14:00"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_display_format() {
        let timestamp = Utc.with_ymd_and_hms(2024, 12, 13, 8, 5, 0).unwrap();
        assert_eq!(display(&timestamp), "13 Dec 2024 08:05");
    }
}
