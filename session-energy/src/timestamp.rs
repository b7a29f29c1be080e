use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, Date, Month, PrimitiveDateTime, Time};

/// Why a `YYYY_MM_DD_HHMMSS` string could not be decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("expected at least 4 '_'-separated segments, found {0}")]
    MissingSegments(usize),
    #[error("invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },
    #[error("out-of-range calendar value: {0}")]
    OutOfRange(String),
}

/// A calendar instant as recorded by the meter and the access controller.
///
/// Stored as a naive local date-time in 24-hour form; the wire encoding is
/// `YYYY_MM_DD_HHMMSS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainTimestamp(PrimitiveDateTime);

impl DomainTimestamp {
    pub fn new(inner: PrimitiveDateTime) -> Self {
        Self(inner)
    }

    /// Decode a `YYYY_MM_DD_HHMMSS` string.
    ///
    /// Only the first four segments are read; the fourth must start with six
    /// digits (`HHMMSS`). Anything after them is ignored.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        let segments: Vec<&str> = s.trim().split('_').collect();
        if segments.len() < 4 {
            return Err(TimestampError::MissingSegments(segments.len()));
        }

        let year: i32 = numeric_field("year", segments[0])?;
        let month: u8 = numeric_field("month", segments[1])?;
        let day: u8 = numeric_field("day", segments[2])?;

        let clock = segments[3];
        let hour: u8 = numeric_field("hour", clock.get(0..2).unwrap_or(""))?;
        let minute: u8 = numeric_field("minute", clock.get(2..4).unwrap_or(""))?;
        let second: u8 = numeric_field("second", clock.get(4..6).unwrap_or(""))?;

        let month = Month::try_from(month).map_err(|e| TimestampError::OutOfRange(e.to_string()))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|e| TimestampError::OutOfRange(e.to_string()))?;
        let time = Time::from_hms(hour, minute, second)
            .map_err(|e| TimestampError::OutOfRange(e.to_string()))?;

        Ok(Self(PrimitiveDateTime::new(date, time)))
    }

    /// Lenient variant used at ingestion: a malformed value means "no usable timestamp".
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match Self::parse(s) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::debug!(value = s, error = %e, "discarding unparseable timestamp");
                None
            }
        }
    }

    /// Canonical `YYYY_MM_DD_HHMMSS` encoding.
    pub fn format(&self) -> String {
        let dt = self.0;
        format!(
            "{:04}_{:02}_{:02}_{:02}{:02}{:02}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        )
    }

    /// Human-facing 12-hour rendering, e.g. `2024-03-10 02:05:00 PM`.
    ///
    /// Display only. Never feed this back into [`DomainTimestamp::parse`].
    pub fn display_12h(&self) -> String {
        self.0
            .format(format_description!(
                "[year]-[month]-[day] [hour repr:12]:[minute]:[second] [period]"
            ))
            .unwrap_or_else(|_| self.format())
    }

    pub fn as_primitive(&self) -> PrimitiveDateTime {
        self.0
    }

    /// Signed distance `self - earlier`.
    pub fn since(&self, earlier: &DomainTimestamp) -> time::Duration {
        self.0 - earlier.0
    }

    pub fn checked_add(&self, d: time::Duration) -> Option<Self> {
        self.0.checked_add(d).map(Self)
    }

    pub fn checked_sub(&self, d: time::Duration) -> Option<Self> {
        self.0.checked_sub(d).map(Self)
    }
}

fn numeric_field<T: FromStr>(field: &'static str, raw: &str) -> Result<T, TimestampError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidField {
            field,
            value: raw.to_string(),
        });
    }
    raw.parse().map_err(|_| TimestampError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

impl fmt::Display for DomainTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for DomainTimestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<PrimitiveDateTime> for DomainTimestamp {
    fn from(inner: PrimitiveDateTime) -> Self {
        Self(inner)
    }
}

impl Serialize for DomainTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for DomainTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
