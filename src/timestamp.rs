//! Lenient timestamp (de)serialization.
//!
//! Timestamps are written as RFC 3339 in UTC. On read, values without an
//! offset (`2024-05-01T10:00:00.123456`) are accepted and taken as UTC so
//! that documents written by older servers still decode.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one as UTC.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Same rules for `Option<DateTime<Utc>>` fields; unparseable values read
/// as `None`.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(super::parse))
    }
}

/// Creation timestamps of records that predate the field.
///
/// Missing, null or unparseable values read as the Unix epoch, so the
/// record sorts as the oldest instead of failing the whole document.
pub mod or_epoch {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        super::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(super::parse)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(default, with = "or_epoch")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_or_epoch_fallbacks() {
        for raw in [r#"{}"#, r#"{"at": null}"#, r#"{"at": "soon"}"#, r#"{"at": 12}"#] {
            let stamped: Stamped = serde_json::from_str(raw).unwrap();
            assert_eq!(stamped.at, DateTime::<Utc>::default(), "input {}", raw);
        }
        let stamped: Stamped = serde_json::from_str(r#"{"at": "2024-05-01T10:00:00"}"#).unwrap();
        assert_eq!(stamped.at.hour(), 10);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let dt = parse("2024-05-01T10:30:00.123456").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse("yesterday").is_none());
    }
}
