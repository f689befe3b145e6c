//! Lenient wire timestamps
//!
//! Timestamps are written as epoch milliseconds. On read, integer or
//! fractional milliseconds and RFC 3339 strings are accepted; anything else
//! becomes `None` so one odd value never rejects a whole session context.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Serialize as epoch milliseconds
pub fn serialize<S>(timestamp: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    chrono::serde::ts_milliseconds_option::serialize(timestamp, serializer)
}

/// Deserialize from milliseconds or an RFC 3339 string
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(from_value))
}

fn from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => Utc.timestamp_millis_opt(ms).single(),
            None => n
                .as_f64()
                .filter(|ms| ms.is_finite())
                .and_then(|ms| Utc.timestamp_millis_opt(ms.round() as i64).single()),
        },
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(default, with = "crate::schema::timestamp")]
        at: Option<DateTime<Utc>>,
    }

    fn read(value: Value) -> Option<DateTime<Utc>> {
        serde_json::from_value::<Stamped>(json!({ "at": value }))
            .unwrap()
            .at
    }

    #[test]
    fn test_accepts_integer_millis() {
        assert_eq!(
            read(json!(1705327200000_i64)),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_accepts_rfc3339() {
        assert_eq!(
            read(json!("2024-01-15T15:00:00+01:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_fractional_millis_round() {
        let at = read(json!(1705327200000.6)).unwrap();
        assert_eq!(at.timestamp_millis(), 1705327200001);
    }

    #[test]
    fn test_unreadable_becomes_none() {
        assert_eq!(read(json!("yesterday")), None);
        assert_eq!(read(json!(true)), None);
        assert_eq!(read(Value::Null), None);
    }

    #[test]
    fn test_writes_millis() {
        let stamped = Stamped {
            at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()),
        };
        assert_eq!(
            serde_json::to_value(&stamped).unwrap(),
            json!({ "at": 1705327200000_i64 })
        );
    }
}
