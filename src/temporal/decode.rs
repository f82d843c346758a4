//! Parsing and formatting of API date values

use std::fmt;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::timezone::{api_timezone, TimezoneError, TimezoneResolver};

const OFFSET_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
const OFFSET_TIMESTAMP_OUTPUT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur while decoding date values
#[derive(Debug, Error)]
pub enum TemporalError {
    /// Input does not match the expected layout
    #[error("parse {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The API timezone could not be resolved
    #[error("load location: {0}")]
    Timezone(#[from] TimezoneError),

    /// The start of the day is skipped by a transition in the timezone
    #[error("midnight of {date} does not exist in {timezone}")]
    NonexistentMidnight { date: NaiveDate, timezone: String },
}

/// Timestamp with an explicit UTC offset and millisecond precision
///
/// Equality compares instants, so `10:30+03:00` equals `07:30+00:00`.
///
/// # Example
///
/// ```
/// use tbank_session::temporal::DateTimeMilliOffset;
///
/// let ts = DateTimeMilliOffset::parse("2021-06-15T10:30:00.123+03:00").unwrap();
/// assert_eq!(ts.to_utc().to_rfc3339(), "2021-06-15T07:30:00.123+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTimeMilliOffset(DateTime<FixedOffset>);

impl DateTimeMilliOffset {
    /// Parses a timestamp such as `2021-06-15T10:30:00.123+03:00`
    ///
    /// The fractional part is optional. Digits past milliseconds are
    /// truncated, so the parsed value is exactly what gets encoded back.
    pub fn parse(s: &str) -> Result<Self, TemporalError> {
        DateTime::parse_from_str(s, OFFSET_TIMESTAMP_FORMAT)
            .map(truncate_to_millis)
            .map(Self)
            .map_err(|source| TemporalError::Parse {
                input: s.to_string(),
                source,
            })
    }

    /// Returns the timestamp with its original offset
    pub fn time(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// Returns the same instant in UTC
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl From<DateTime<FixedOffset>> for DateTimeMilliOffset {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(truncate_to_millis(value))
    }
}

fn truncate_to_millis(time: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let nanos = time.nanosecond() / 1_000_000 * 1_000_000;
    time.with_nanosecond(nanos).unwrap_or(time)
}

impl fmt::Display for DateTimeMilliOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OFFSET_TIMESTAMP_OUTPUT))
    }
}

impl Serialize for DateTimeMilliOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateTimeMilliOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// Calendar date, anchored at local midnight in the API timezone
///
/// The executing machine's own timezone plays no part in decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Date(DateTime<Tz>);

impl Date {
    /// Parses `YYYY-MM-DD` in the process-wide API timezone
    pub fn parse(s: &str) -> Result<Self, TemporalError> {
        Self::parse_in(api_timezone(), s)
    }

    /// Parses `YYYY-MM-DD` in the timezone provided by `resolver`
    ///
    /// The timezone is resolved before the input is looked at, so a
    /// resolution failure is reported even for malformed input.
    pub fn parse_in(resolver: &TimezoneResolver, s: &str) -> Result<Self, TemporalError> {
        let tz = resolver.get()?;
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|source| {
            TemporalError::Parse {
                input: s.to_string(),
                source,
            }
        })?;
        Self::from_naive(date, tz)
    }

    /// Anchors a calendar date at the start of that day in `tz`
    ///
    /// When the clocks jump forward at midnight, the day starts at the
    /// first local time that exists (01:00 for a one hour gap).
    pub fn from_naive(date: NaiveDate, tz: Tz) -> Result<Self, TemporalError> {
        let midnight = date.and_time(NaiveTime::MIN);
        if let Some(start) = tz.from_local_datetime(&midnight).earliest() {
            return Ok(Self(start));
        }

        // Midnight is in a gap: the day begins at the transition, i.e. at
        // midnight read with the offset in force before it
        let before = tz
            .offset_from_utc_datetime(&(midnight - Duration::days(1)))
            .fix();
        let transition = midnight - Duration::seconds(i64::from(before.local_minus_utc()));
        let start = tz.from_utc_datetime(&transition);

        if start.date_naive() == date {
            Ok(Self(start))
        } else {
            Err(TemporalError::NonexistentMidnight {
                date,
                timezone: tz.name().to_string(),
            })
        }
    }

    /// Returns the start of the day in the API timezone
    pub fn time(&self) -> DateTime<Tz> {
        self.0.clone()
    }

    /// Returns the calendar date as seen in the API timezone
    pub fn date_naive(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_offset_timestamp_instant() {
        let ts = DateTimeMilliOffset::parse("2021-06-15T10:30:00.123+03:00").unwrap();
        assert_eq!(ts.to_utc(), utc("2021-06-15T07:30:00.123Z"));
        assert_eq!(ts.time().offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_offset_timestamp_without_fraction() {
        let ts = DateTimeMilliOffset::parse("2021-06-15T10:30:00+03:00").unwrap();
        assert_eq!(ts.to_utc(), utc("2021-06-15T07:30:00Z"));
    }

    #[test]
    fn test_offset_timestamp_malformed() {
        for input in ["", "2021-06-15", "2021-06-15T10:30:00.123", "yesterday"] {
            let err = DateTimeMilliOffset::parse(input).unwrap_err();
            assert!(matches!(err, TemporalError::Parse { .. }), "{input}: {err}");
        }
    }

    #[test]
    fn test_offset_timestamp_reencode() {
        let ts = DateTimeMilliOffset::parse("2021-06-15T10:30:00.123+03:00").unwrap();
        assert_eq!(ts.to_string(), "2021-06-15T10:30:00.123+03:00");

        let again = DateTimeMilliOffset::parse(&ts.to_string()).unwrap();
        assert_eq!(ts, again);
    }

    #[test]
    fn test_offset_timestamp_sub_millisecond_is_truncated() {
        let ts = DateTimeMilliOffset::parse("2021-06-15T10:30:00.1234+03:00").unwrap();
        assert_eq!(ts, DateTimeMilliOffset::parse("2021-06-15T10:30:00.123+03:00").unwrap());
        assert_eq!(ts.to_string(), "2021-06-15T10:30:00.123+03:00");

        let again = DateTimeMilliOffset::parse(&ts.to_string()).unwrap();
        assert_eq!(ts, again);

        let json = serde_json::to_string(&ts).unwrap();
        let back: DateTimeMilliOffset = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }

    #[test]
    fn test_offset_timestamp_equality_is_by_instant() {
        let a = DateTimeMilliOffset::parse("2021-06-15T10:30:00.123+03:00").unwrap();
        let b = DateTimeMilliOffset::parse("2021-06-15T07:30:00.123+00:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_offset_timestamp_serde() {
        let ts: DateTimeMilliOffset =
            serde_json::from_str("\"2021-06-15T10:30:00.1+03:00\"").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2021-06-15T10:30:00.100+03:00\"");

        let back: DateTimeMilliOffset = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);

        assert!(serde_json::from_str::<DateTimeMilliOffset>("12345").is_err());
        assert!(serde_json::from_str::<DateTimeMilliOffset>("\"bad\"").is_err());
    }

    #[test]
    fn test_date_is_moscow_midnight() {
        let date = Date::parse("2021-06-15").unwrap();
        assert_eq!(date.time().with_timezone(&Utc), utc("2021-06-14T21:00:00Z"));
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2021, 6, 15).unwrap());
        assert_eq!(date.time().timezone(), chrono_tz::Europe::Moscow);
    }

    #[test]
    fn test_date_with_injected_timezone() {
        let resolver = TimezoneResolver::named("America/New_York");
        let date = Date::parse_in(&resolver, "2021-06-15").unwrap();
        // EDT is UTC-4 in June
        assert_eq!(date.time().with_timezone(&Utc), utc("2021-06-15T04:00:00Z"));
        assert_eq!(date.to_string(), "2021-06-15");
    }

    #[test]
    fn test_date_skipped_midnight_in_moscow() {
        // Summer time started at 00:00 on 1981-04-01, clocks went to 01:00
        let date = Date::parse("1981-04-01").unwrap();
        assert_eq!(date.time().with_timezone(&Utc), utc("1981-03-31T21:00:00Z"));
        assert_eq!(date.time().offset().fix().local_minus_utc(), 4 * 3600);
        assert_eq!(date.time().time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        assert_eq!(date.to_string(), "1981-04-01");
    }

    #[test]
    fn test_date_skipped_midnight_in_santiago() {
        // Chile moved clocks forward at local midnight on 2022-09-11
        let date = Date::from_naive(
            NaiveDate::from_ymd_opt(2022, 9, 11).unwrap(),
            chrono_tz::America::Santiago,
        )
        .unwrap();
        assert_eq!(date.time().with_timezone(&Utc), utc("2022-09-11T04:00:00Z"));
        assert_eq!(date.time().time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2022, 9, 11).unwrap());
    }

    #[test]
    fn test_date_day_before_gap_is_plain_midnight() {
        let date = Date::parse("1981-03-31").unwrap();
        assert_eq!(date.time().with_timezone(&Utc), utc("1981-03-30T21:00:00Z"));
    }

    #[test]
    fn test_date_malformed() {
        for input in ["", "15.06.2021", "2021-13-01", "2021-06-15T00:00:00"] {
            let err = Date::parse(input).unwrap_err();
            assert!(matches!(err, TemporalError::Parse { .. }), "{input}: {err}");
        }
    }

    #[test]
    fn test_date_timezone_failure_is_reported() {
        let resolver = TimezoneResolver::named("Nowhere/Special");
        let err = Date::parse_in(&resolver, "2021-06-15").unwrap_err();
        assert!(matches!(err, TemporalError::Timezone(_)));
        assert!(err.to_string().starts_with("load location"));

        // Same error the second time, even for malformed input
        let err = Date::parse_in(&resolver, "garbage").unwrap_err();
        assert!(matches!(err, TemporalError::Timezone(_)));
    }

    #[test]
    fn test_date_serde_reencode() {
        let date: Date = serde_json::from_str("\"2021-06-15\"").unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2021-06-15\"");

        let again: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(date, again);
        assert_eq!(date.date_naive(), again.date_naive());
    }
}
