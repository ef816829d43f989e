//! Timestamp formatting for SigV4.
//!
//! A signing operation reads the clock at most once. [`SigningTime`] holds that
//! instant so `X-Amz-Date` and the credential scope date always come from the
//! same value, even across a UTC midnight boundary.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// ISO 8601 basic format used by `X-Amz-Date` (`YYYYMMDDTHHMMSSZ`).
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date format used in the credential scope (`YYYYMMDD`).
pub const DATE_STAMP_FORMAT: &str = "%Y%m%d";

/// The single instant a signature is computed for, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningTime(DateTime<Utc>);

impl SigningTime {
    /// Capture `instant`, dropping sub-second precision.
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(0))
    }

    /// The captured instant.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// `YYYYMMDDTHHMMSSZ`
    #[must_use]
    pub fn amz_date(&self) -> String {
        self.0.format(AMZ_DATE_FORMAT).to_string()
    }

    /// `YYYYMMDD`
    #[must_use]
    pub fn date_stamp(&self) -> String {
        self.0.format(DATE_STAMP_FORMAT).to_string()
    }
}

impl From<DateTime<Utc>> for SigningTime {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

/// Parse an `X-Amz-Date` value back into a UTC instant.
#[must_use]
pub fn parse_amz_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, AMZ_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_should_format_amz_date_and_date_stamp() {
        let time = SigningTime::new(Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap());
        assert_eq!(time.amz_date(), "20130524T000000Z");
        assert_eq!(time.date_stamp(), "20130524");
    }

    #[test]
    fn test_should_keep_date_and_timestamp_consistent_at_midnight() {
        let just_before = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(999);
        let time = SigningTime::new(just_before);
        assert_eq!(time.amz_date(), "20241231T235959Z");
        assert_eq!(time.date_stamp(), "20241231");
        assert!(time.amz_date().starts_with(&time.date_stamp()));
    }

    #[test]
    fn test_should_truncate_subseconds() {
        let instant = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        let time = SigningTime::new(instant);
        assert_eq!(
            time.instant(),
            Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_should_parse_amz_date() {
        let parsed = parse_amz_date("20130524T000000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap());
        assert!(parse_amz_date("2013-05-24T00:00:00Z").is_none());
    }
}
