pub mod competitor;
pub mod matches;
pub mod news;
pub mod tournament;
pub mod user;

pub use competitor::*;
pub use matches::*;
pub use news::*;
pub use tournament::*;
pub use user::*;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer};

/// A stored enum column held a value no variant matches.
#[derive(Debug, thiserror::Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

/// Collects every schema violation of a record before a write.
#[derive(Debug, Default)]
pub struct SchemaCheck {
    errors: Vec<String>,
}

impl SchemaCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, value: &str, message: &str) -> Self {
        if value.trim().is_empty() {
            self.errors.push(message.to_string());
        }
        self
    }

    pub fn ensure(mut self, ok: bool, message: &str) -> Self {
        if !ok {
            self.errors.push(message.to_string());
        }
        self
    }

    pub fn finish(self) -> Result<(), Vec<String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC)
/// and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

/// Serde adapter for optional, leniently formatted timestamps in payloads.
pub fn de_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date `{s}`"))),
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn de_nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims and drops blank strings.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339_and_plain_dates() {
        let full = parse_datetime("2030-05-01T12:30:00+02:00").unwrap();
        assert_eq!(full.hour(), 10);

        let naive = parse_datetime("2030-05-01T12:30:00").unwrap();
        assert_eq!(naive.hour(), 12);

        let date = parse_datetime("2030-05-01").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2030, 5, 1));
        assert_eq!(date.hour(), 0);

        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn schema_check_reports_every_violation() {
        let errors = SchemaCheck::new()
            .require("", "Title is required")
            .require("  ", "Content is required")
            .ensure(true, "never")
            .finish()
            .unwrap_err();
        assert_eq!(errors, vec!["Title is required", "Content is required"]);
    }

    #[test]
    fn clean_drops_blank_values() {
        assert_eq!(clean(Some("  Cup ".into())), Some("Cup".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }
}
