//! Serde helpers for timestamps and times of day at the backend boundary.
//!
//! The backend returns `timestamptz` columns as RFC 3339 with an offset and `timestamp`
//! columns as naive ISO strings. Clinic times are wall-clock times, so both are read into
//! `NaiveDateTime` (an offset is dropped after converting to the local wall time it
//! carries) and always written back as naive ISO.
//!
//! `time` columns come back as `HH:MM:SS`; forms send `HH:MM`. Both are accepted.

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M";

/// Parse a timestamp in any of the forms the backend produces.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.naive_local())
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(NAIVE_FORMAT).to_string()
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, TIME_FORMAT))
        .ok()
}

pub fn format_time(value: &NaiveTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

pub mod naive {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&format_timestamp(v)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
        }
    }
}

pub mod time_option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&format_time(v)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse_time(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{raw}'"))),
        }
    }
}

pub mod time {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_time(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_time(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid date")
    }

    #[test]
    fn parses_naive_and_offset_forms() {
        assert_eq!(parse_timestamp("2025-03-10T09:00:00"), Some(at(9, 0)));
        assert_eq!(parse_timestamp("2025-03-10T09:00:00.000"), Some(at(9, 0)));
        assert_eq!(parse_timestamp("2025-03-10 09:00:00"), Some(at(9, 0)));
        assert_eq!(parse_timestamp("2025-03-10T09:00"), Some(at(9, 0)));
        assert_eq!(parse_timestamp("2025-03-10T09:00:00-03:00"), Some(at(9, 0)));
        assert_eq!(parse_timestamp("2025-03-10T09:00:00+00:00"), Some(at(9, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn formats_without_offset() {
        assert_eq!(format_timestamp(&at(9, 30)), "2025-03-10T09:30:00");
    }

    #[test]
    fn parses_both_time_forms() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("valid time");
        assert_eq!(parse_time("09:00"), Some(nine));
        assert_eq!(parse_time("09:00:00"), Some(nine));
        assert_eq!(parse_time("9h"), None);
        assert_eq!(format_time(&nine), "09:00");
    }
}
