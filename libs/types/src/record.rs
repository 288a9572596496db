//! OHLCV record types
//!
//! `RawRecord` is one row of a window as the remote service returns it
//! (`start_time` in Unix nanoseconds). `NormalizedPoint` is the chart-ready
//! shape handed to the render sink (`timestamp` in Unix milliseconds,
//! volume and trade id dropped).

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Nanoseconds in one millisecond.
pub const NANOS_PER_MILLI: i64 = 1_000_000;

/// Convert a nanosecond epoch timestamp to milliseconds.
///
/// Floor division: sub-millisecond remainders are discarded, never rounded.
pub fn nanos_to_millis(nanos: i64) -> i64 {
    nanos.div_euclid(NANOS_PER_MILLI)
}

/// One raw OHLCV row from the windowed-data endpoint
///
/// Numeric fields accept JSON numbers or numeric strings; database drivers
/// on the remote side serialize DECIMAL columns either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "flexible_i64")]
    pub trade_id: i64,
    #[serde(deserialize_with = "flexible_f64")]
    pub open: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub high: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub low: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub close: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub volume: f64,
    /// Unix nanoseconds
    #[serde(deserialize_with = "flexible_i64")]
    pub start_time: i64,
}

/// A chart-ready candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Unix milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl NormalizedPoint {
    /// Build a point from a raw record, converting its timestamp.
    pub fn from_raw(record: &RawRecord) -> Self {
        Self {
            timestamp: nanos_to_millis(record.start_time),
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
        }
    }

    /// Timestamp as a UTC datetime, if representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// True when close >= open.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Numeric::deserialize(deserializer)? {
        Numeric::Int(i) => Ok(i as f64),
        Numeric::Float(f) => Ok(f),
        Numeric::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| de::Error::custom(format!("invalid number {s:?}: {e}"))),
    }
}

fn flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Numeric::deserialize(deserializer)? {
        Numeric::Int(i) => Ok(i),
        Numeric::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        Numeric::Float(f) => Err(de::Error::custom(format!("expected integer, got {f}"))),
        Numeric::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| de::Error::custom(format!("invalid integer {s:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nanos_to_millis_truncates() {
        assert_eq!(nanos_to_millis(1_708_123_456_789_999_999), 1_708_123_456_789);
        assert_eq!(nanos_to_millis(999_999), 0);
        assert_eq!(nanos_to_millis(1_000_000), 1);
    }

    #[test]
    fn test_nanos_to_millis_floors_negative() {
        assert_eq!(nanos_to_millis(-1), -1);
        assert_eq!(nanos_to_millis(-1_000_000), -1);
        assert_eq!(nanos_to_millis(-1_000_001), -2);
    }

    #[test]
    fn test_raw_record_from_remote_json() {
        let json = r#"{
            "trade_id": 17,
            "open": 101.5,
            "high": 103,
            "low": "100.25",
            "close": 102.0,
            "volume": 3400.0,
            "start_time": 1708123456789000000
        }"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.trade_id, 17);
        assert_eq!(record.high, 103.0);
        assert_eq!(record.low, 100.25);
        assert_eq!(record.start_time, 1_708_123_456_789_000_000);
    }

    #[test]
    fn test_raw_record_string_timestamp() {
        let json = r#"{"trade_id":"3","open":1,"high":2,"low":0.5,"close":1.5,"volume":10,"start_time":"1708123456789000000"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.trade_id, 3);
        assert_eq!(record.start_time, 1_708_123_456_789_000_000);
    }

    #[test]
    fn test_raw_record_rejects_garbage() {
        let json = r#"{"trade_id":1,"open":"abc","high":2,"low":0.5,"close":1.5,"volume":10,"start_time":0}"#;
        assert!(serde_json::from_str::<RawRecord>(json).is_err());

        let missing = r#"{"trade_id":1,"open":1,"high":2,"low":0.5,"close":1.5,"volume":10}"#;
        assert!(serde_json::from_str::<RawRecord>(missing).is_err());
    }

    #[test]
    fn test_point_from_raw_drops_volume() {
        let record = RawRecord {
            trade_id: 9,
            open: 10.0,
            high: 12.0,
            low: 9.5,
            close: 11.0,
            volume: 500.0,
            start_time: 1_700_000_000_123_456_789,
        };
        let point = NormalizedPoint::from_raw(&record);
        assert_eq!(point.timestamp, 1_700_000_000_123);
        assert_eq!(point.open, 10.0);
        assert_eq!(point.close, 11.0);
        assert!(point.is_bullish());

        let json = serde_json::to_value(point).unwrap();
        assert!(json.get("volume").is_none());
        assert!(json.get("trade_id").is_none());
    }

    #[test]
    fn test_point_datetime() {
        let point = NormalizedPoint {
            timestamp: 1_700_000_000_000,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
        };
        let dt = point.datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    proptest! {
        #[test]
        fn nanos_to_millis_is_floor(n in any::<i64>()) {
            let millis = nanos_to_millis(n) as i128;
            let nanos = n as i128;
            prop_assert!(millis * 1_000_000 <= nanos);
            prop_assert!(nanos < (millis + 1) * 1_000_000);
        }

        #[test]
        fn integer_strings_parse_like_numbers(n in any::<i64>()) {
            let as_number = format!(
                r#"{{"trade_id":{n},"open":1,"high":1,"low":1,"close":1,"volume":1,"start_time":{n}}}"#
            );
            let as_text = format!(
                r#"{{"trade_id":"{n}","open":"1","high":"1","low":"1","close":"1","volume":"1","start_time":"{n}"}}"#
            );
            let a: RawRecord = serde_json::from_str(&as_number).unwrap();
            let b: RawRecord = serde_json::from_str(&as_text).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
