//! Shared helpers for converting PayPal timestamps into stored values.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};

/// Current time as unix seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Unix seconds for an optional PayPal timestamp.
pub fn unix_time(time: Option<DateTime<Utc>>) -> Option<i64> {
    time.map(|t| t.timestamp())
}

/// Unix seconds for a timestamp that must be present in the response.
pub fn required_unix_time(time: Option<DateTime<Utc>>, field: &'static str) -> Result<i64> {
    unix_time(time).ok_or(AppError::MissingField(field))
}

/// Take a required value out of a PayPal response.
pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(AppError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_time() {
        let t = Utc.with_ymd_and_hms(2019, 1, 10, 21, 20, 49).unwrap();
        assert_eq!(unix_time(Some(t)), Some(1547155249));
        assert_eq!(unix_time(None), None);
    }

    #[test]
    fn test_required_reports_field() {
        let err = required_unix_time(None, "create_time").unwrap_err();
        assert!(matches!(err, AppError::MissingField("create_time")));
        assert_eq!(required(Some(3), "x").unwrap(), 3);
    }
}
