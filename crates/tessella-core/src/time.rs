use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// RFC 3339 timestamp used on records and execution log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for Timestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s, &Rfc3339).map_err(|e| {
            CoreError::invalid_date_time(format!("Failed to parse timestamp '{s}': {e}"))
        })?;
        Ok(Timestamp(datetime))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self
            .0
            .format(&Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Current time as a `Timestamp`.
pub fn now_utc() -> Timestamp {
    Timestamp(OffsetDateTime::now_utc())
}

/// Parses a datetime field value and returns its canonical RFC 3339 form.
///
/// Accepts RFC 3339 with either `Z` or a numeric offset.
pub fn canonical_datetime(value: &str) -> Result<String> {
    let parsed = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(format!("'{value}': {e}")))?;
    parsed
        .format(&Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(format!("'{value}': {e}")))
}

/// Parses a date field value (`YYYY-MM-DD` or a full RFC 3339 datetime) and
/// returns the canonical `YYYY-MM-DD` form.
pub fn canonical_date(value: &str) -> Result<String> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(value, &format) {
        return date
            .format(&format)
            .map_err(|e| CoreError::invalid_date_time(format!("'{value}': {e}")));
    }
    // Fall back to a full datetime and keep only the date part.
    let parsed = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(format!("'{value}': {e}")))?;
    parsed
        .date()
        .format(&format)
        .map_err(|e| CoreError::invalid_date_time(format!("'{value}': {e}")))
}
