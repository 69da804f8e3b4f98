// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and parsing.
//!
//! The backend emits both RFC 3339 timestamps and zone-less local
//! date-times (`2025-03-01T07:30:00.123`). Zone-less values are read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a timestamp in either RFC 3339 or zone-less ISO 8601 form.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde adapter for required timestamps.
pub mod timestamp {
    use super::{format_utc_rfc3339, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_utc_rfc3339(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// Serde adapter for optional timestamps. Use together with `#[serde(default)]`.
pub mod option_timestamp {
    use super::{format_utc_rfc3339, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&format_utc_rfc3339(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parsed = parse_timestamp("2025-03-01T09:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_zoneless_local_datetime() {
        let parsed = parse_timestamp("2025-03-01T07:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap());

        let fractional = parse_timestamp("2025-03-01T07:30:00.123456").unwrap();
        assert_eq!(format_utc_rfc3339(fractional), "2025-03-01T07:30:00Z");
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
