//! Time and timestamp utilities

use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

/// Truncate an instant to the start of its UTC hour
pub fn hour_bucket(time: DateTime<Utc>) -> DateTime<Utc> {
    let secs = time.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(SECONDS_PER_HOUR), 0).unwrap_or(time)
}

/// Human-readable bucket label in the given timeline, e.g. `Mar 1, 10:00 AM`
pub fn bucket_label(bucket: DateTime<Utc>, offset: FixedOffset) -> String {
    bucket
        .with_timezone(&offset)
        .format("%b %-d, %I:%M %p")
        .to_string()
}

/// Heatmap coordinates `(day, hour)` of an instant in the given timeline
///
/// Days are Monday = 0 ... Sunday = 6, remapped from a Sunday-first index.
pub fn heatmap_coordinates(time: DateTime<Utc>, offset: FixedOffset) -> (usize, usize) {
    let local = time.with_timezone(&offset);
    let sunday_first = local.weekday().num_days_from_sunday() as usize;
    ((sunday_first + 6) % 7, local.hour() as usize)
}

/// Elapsed seconds rounded to two decimals
pub fn elapsed_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// Serde adapter: epoch milliseconds on output, milliseconds or RFC 3339 on input
pub mod epoch_millis {
    use std::fmt;

    use chrono::{DateTime, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(time.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_any(TimeVisitor)
    }

    struct TimeVisitor;

    impl TimeVisitor {
        fn from_millis<E: de::Error>(millis: i64) -> Result<DateTime<Utc>, E> {
            DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| E::custom(format!("timestamp out of range: {}", millis)))
        }
    }

    impl<'de> Visitor<'de> for TimeVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("epoch milliseconds or an RFC 3339 timestamp")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Self::from_millis(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            let millis = i64::try_from(v).map_err(|_| E::custom("timestamp out of range"))?;
            Self::from_millis(millis)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Self::from_millis(v as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            DateTime::parse_from_rfc3339(v)
                .map(|t| t.with_timezone(&Utc))
                .map_err(E::custom)
        }
    }
}
