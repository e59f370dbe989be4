//! Calendar-day and timestamp handling for the whole service.
//!
//! Calendar days (driver start dates, event dates) travel as `YYYY-MM-DD`
//! and are never treated as instants. Timestamps (truck history) are stored
//! in UTC and rendered in the configured reference timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const DAY_FORMAT: &str = "%Y-%m-%d";

const STORED_STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const NAIVE_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDay(String),

    #[error("invalid date prefix '{0}', expected YYYY, YYYY-MM or YYYY-MM-DD")]
    InvalidPrefix(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// The single reference timezone every date conversion goes through.
#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
    tz: Tz,
}

impl LocalCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.localize(Utc::now())
    }

    pub fn localize(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.tz).fixed_offset()
    }

    /// Reads a stored calendar-day column.
    ///
    /// Plain dates are taken as is. Instants (RFC 3339, or naive date-times
    /// which are UTC) are moved into the reference zone first.
    pub fn day_from_stored(&self, raw: &str) -> Result<NaiveDate, DateError> {
        let raw = raw.trim();
        if let Ok(day) = parse_day(raw) {
            return Ok(day);
        }

        self.instant_from_stored(raw)
            .map(|at| at.with_timezone(&self.tz).date_naive())
            .map_err(|_| DateError::InvalidDay(raw.to_string()))
    }

    pub fn timestamp_from_stored(&self, raw: &str) -> Result<DateTime<FixedOffset>, DateError> {
        self.instant_from_stored(raw.trim()).map(|at| self.localize(at))
    }

    fn instant_from_stored(&self, raw: &str) -> Result<DateTime<Utc>, DateError> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(at.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(raw, NAIVE_STAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| DateError::InvalidTimestamp(raw.to_string()))
    }
}

/// Fixed-width UTC text, so that lexical order on the column is chronological.
pub fn stamp_for_storage(at: DateTime<Utc>) -> String {
    at.format(STORED_STAMP_FORMAT).to_string()
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Strict `YYYY-MM-DD`: zero padded, no sign, no trailing text.
pub fn parse_day(raw: &str) -> Result<NaiveDate, DateError> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shaped {
        return Err(DateError::InvalidDay(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, DAY_FORMAT).map_err(|_| DateError::InvalidDay(raw.to_string()))
}

/// A year, year-month or full-day prefix used to match stored calendar days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePrefix(String);

impl DatePrefix {
    pub fn parse(raw: &str) -> Result<Self, DateError> {
        let raw = raw.trim();
        let invalid = || DateError::InvalidPrefix(raw.to_string());
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        if !raw.is_ascii() {
            return Err(invalid());
        }

        match raw.len() {
            4 if digits(raw) => {}
            7 if digits(&raw[..4]) && &raw[4..5] == "-" && digits(&raw[5..]) => {
                let month: u32 = raw[5..].parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
            }
            10 => {
                parse_day(raw).map_err(|_| invalid())?;
            }
            _ => return Err(invalid()),
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix pattern for `LIKE`; the shape check above rules out wildcards.
    pub fn like_pattern(&self) -> String {
        format!("{}%", self.0)
    }

    pub fn matches(&self, day: NaiveDate) -> bool {
        format_day(day).starts_with(&self.0)
    }
}

/// Serde adapter for required calendar-day fields.
pub mod calendar_day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_day(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional calendar days; `null` and `""` both mean none.
pub mod optional_calendar_day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        day: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match day {
            Some(day) => serializer.serialize_str(&super::format_day(*day)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_day(raw.trim())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
