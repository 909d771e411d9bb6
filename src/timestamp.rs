//! Capture time extraction from sidecar JSON
//!
//! Sidecars come from more than one exporter and do not share a schema. The
//! extractor looks at a fixed list of keys and accepts several shapes for the
//! value under each:
//!
//! - `{"photoTakenTime": {"timestamp": "1700000000", ...}}` (nested object)
//! - `{"creationTime": 1700000000000}` (epoch number, seconds or millis)
//! - `{"dateTaken": "2023-05-01T10:00:00Z"}` (ISO-8601 text)
//!
//! Epoch numbers become a naive wall-clock time in the machine's local zone.
//! ISO strings are returned exactly as parsed, keeping their offset if they
//! had one. The two paths are deliberately kept apart in [`ResolvedTimestamp`]
//! rather than being unified to a single zone.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::num::IntErrorKind;
use std::time::SystemTime;
use tracing::{debug, trace};

/// Sidecar keys inspected, in priority order
pub const CANDIDATE_KEYS: [&str; 4] = ["creationTime", "photoTakenTime", "dateTaken", "timestamp"];

/// Epoch values above this are taken to be milliseconds.
///
/// 1e11 seconds is roughly the year 5138, so any realistic seconds value
/// stays below it while any millisecond value after March 1973 lands above.
/// Millisecond values before that, and second values far in the future, are
/// misread.
pub const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
pub const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Format accepted by ffmpeg's `creation_time` tag
pub const FFMPEG_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A capture time resolved from a sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTimestamp {
    /// Wall-clock time with no zone attached. Epoch values are converted to
    /// the local zone; ISO strings without an offset are kept as written.
    Naive(NaiveDateTime),
    /// ISO string that carried an explicit offset (a trailing `Z` is UTC)
    Zoned(DateTime<FixedOffset>),
}

impl ResolvedTimestamp {
    /// Wall-clock reading of this timestamp, in its own zone for `Zoned`
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            ResolvedTimestamp::Naive(dt) => *dt,
            ResolvedTimestamp::Zoned(dt) => dt.naive_local(),
        }
    }

    /// Formatted for the three EXIF date fields
    pub fn exif_string(&self) -> String {
        self.wall_clock().format(EXIF_FORMAT).to_string()
    }

    /// Formatted for ffmpeg's `creation_time` metadata
    pub fn ffmpeg_string(&self) -> String {
        self.wall_clock().format(FFMPEG_FORMAT).to_string()
    }

    /// Absolute instant, interpreting naive values in the local zone.
    ///
    /// Returns `None` for a naive time skipped by a DST transition.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        match self {
            ResolvedTimestamp::Naive(dt) => Local.from_local_datetime(dt).earliest().map(SystemTime::from),
            ResolvedTimestamp::Zoned(dt) => Some(SystemTime::from(*dt)),
        }
    }
}

impl std::fmt::Display for ResolvedTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedTimestamp::Naive(dt) => write!(f, "{}", dt),
            ResolvedTimestamp::Zoned(dt) => write!(f, "{}", dt),
        }
    }
}

/// Numeric epoch as found in the sidecar, before scale detection
#[derive(Debug, Clone, Copy, PartialEq)]
enum Epoch {
    Int(i64),
    Float(f64),
}

impl Epoch {
    /// Zero counts as absent, like any other falsy value
    fn is_zero(&self) -> bool {
        match self {
            Epoch::Int(n) => *n == 0,
            Epoch::Float(f) => *f == 0.0,
        }
    }

    fn to_utc(self) -> Option<DateTime<Utc>> {
        match self {
            Epoch::Int(n) if n > MILLIS_THRESHOLD => DateTime::from_timestamp_millis(n),
            Epoch::Int(n) => DateTime::from_timestamp(n, 0),
            Epoch::Float(f) => {
                let secs = if f > MILLIS_THRESHOLD as f64 { f / 1000.0 } else { f };
                let whole = secs.floor();
                let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
                DateTime::from_timestamp(whole as i64, nanos)
            }
        }
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Epoch::Int(n) => write!(f, "{}", n),
            Epoch::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Outcome of inspecting the value under one candidate key
enum KeyValue {
    Epoch(Epoch),
    Parsed(ResolvedTimestamp),
    /// Integer string too large for any epoch
    Overflow(String),
    Unusable,
}

/// Extract a capture time from a parsed sidecar.
///
/// Keys from [`CANDIDATE_KEYS`] are tried in order. The first key that holds
/// an ISO string returns immediately; otherwise the first key holding a
/// non-zero epoch wins. A key whose value is zero, empty, or of an unexpected
/// shape is passed over. `Ok(None)` means nothing usable was found; an error
/// is returned only for an epoch outside the representable date range.
pub fn extract(record: &Value) -> Result<Option<ResolvedTimestamp>> {
    let Some(map) = record.as_object() else {
        trace!("Sidecar root is not an object");
        return Ok(None);
    };

    for key in CANDIDATE_KEYS {
        let Some(value) = map.get(key) else {
            continue;
        };

        match inspect(value) {
            KeyValue::Parsed(ts) => {
                debug!(key, %ts, "Resolved ISO-8601 timestamp");
                return Ok(Some(ts));
            }
            KeyValue::Epoch(epoch) if !epoch.is_zero() => {
                let utc = epoch.to_utc().ok_or_else(|| Error::TimestampOutOfRange {
                    key,
                    value: epoch.to_string(),
                })?;
                let local = utc.with_timezone(&Local).naive_local();
                debug!(key, %epoch, %local, "Resolved epoch timestamp");
                return Ok(Some(ResolvedTimestamp::Naive(local)));
            }
            KeyValue::Overflow(value) => return Err(Error::TimestampOutOfRange { key, value }),
            _ => trace!(key, "Key present but holds no usable timestamp"),
        }
    }

    Ok(None)
}

fn inspect(value: &Value) -> KeyValue {
    // {"timestamp": ...} wrappers are unwrapped one level
    let value = value.get("timestamp").unwrap_or(value);

    match value {
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(n) => KeyValue::Epoch(Epoch::Int(n)),
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                KeyValue::Overflow(text.trim().to_string())
            }
            Err(_) => parse_iso8601(text).map_or(KeyValue::Unusable, KeyValue::Parsed),
        },
        Value::Number(n) => n
            .as_i64()
            .map(Epoch::Int)
            .or_else(|| n.as_f64().map(Epoch::Float))
            .map_or(KeyValue::Unusable, KeyValue::Epoch),
        _ => KeyValue::Unusable,
    }
}

/// Parse an ISO-8601 date or date-time.
///
/// A `Z` suffix is read as `+00:00`. Strings with an offset produce
/// [`ResolvedTimestamp::Zoned`]; strings without one are taken as written.
pub fn parse_iso8601(text: &str) -> Option<ResolvedTimestamp> {
    let normalized = text.trim().replace('Z', "+00:00");

    const ZONED_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M%:z",
    ];
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(ResolvedTimestamp::Zoned(dt));
        }
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(ResolvedTimestamp::Naive(dt));
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(ResolvedTimestamp::Naive)
}
