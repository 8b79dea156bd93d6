// 📅 Date Normalizer
// Feed date string → calendar date → file-name / record representations

use crate::error::DateParseError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// `2023-01-05T00:00:00`, with or without fractional seconds
const FEED_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const FEED_DATE_FORMAT: &str = "%Y-%m-%d";
const FILE_DATE_FORMAT: &str = "%Y%m%d";

/// Parse the date the portal puts in `transaction_date`.
///
/// Accepted shapes, tried in order:
/// - `YYYY-MM-DDTHH:MM:SS[.fff]` (what the transactions endpoint emits)
/// - RFC 3339 with an offset or `Z`
/// - bare `YYYY-MM-DD`
///
/// The calendar date is taken as written. An offset is never used to shift
/// the date into another day.
pub fn parse(raw: &str) -> Result<NaiveDate, DateParseError> {
    let s = raw.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, FEED_DATETIME_FORMAT) {
        return Ok(dt.date());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local().date());
    }

    NaiveDate::parse_from_str(s, FEED_DATE_FORMAT).map_err(|_| DateParseError {
        input: raw.to_string(),
    })
}

/// `YYYYMMDD`: sorts lexicographically in date order
pub fn format_for_file(date: NaiveDate) -> String {
    date.format(FILE_DATE_FORMAT).to_string()
}

/// `MM/DD/YYYY`, the default record layout
pub fn format_for_record(date: NaiveDate) -> String {
    RecordDateStyle::default().format(date)
}

/// Fixed layouts for the date field of QIF/CSV records.
/// None of them depend on the locale or timezone of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordDateStyle {
    /// MM/DD/YYYY
    #[default]
    MonthFirst,
    /// DD/MM/YYYY
    DayFirst,
    /// YYYY-MM-DD
    Iso,
}

impl RecordDateStyle {
    fn pattern(&self) -> &'static str {
        match self {
            RecordDateStyle::MonthFirst => "%m/%d/%Y",
            RecordDateStyle::DayFirst => "%d/%m/%Y",
            RecordDateStyle::Iso => "%Y-%m-%d",
        }
    }

    pub fn format(&self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_feed_format() {
        assert_eq!(parse("2023-01-05T00:00:00").unwrap(), ymd(2023, 1, 5));
        assert_eq!(parse("2023-12-31T23:59:59.123").unwrap(), ymd(2023, 12, 31));
        assert_eq!(parse("  2024-02-29T10:00:00\n").unwrap(), ymd(2024, 2, 29));
    }

    #[test]
    fn test_parse_keeps_written_date_with_offset() {
        // Late evening in Melbourne is still the 5th, not the 4th in UTC
        assert_eq!(parse("2023-01-05T23:30:00+11:00").unwrap(), ymd(2023, 1, 5));
        assert_eq!(parse("2023-01-05T00:00:00Z").unwrap(), ymd(2023, 1, 5));
    }

    #[test]
    fn test_parse_bare_date() {
        assert_eq!(parse("2023-01-05").unwrap(), ymd(2023, 1, 5));
    }

    #[test]
    fn test_parse_rejects_unknown_formats() {
        for bad in ["05/01/2023", "", "2023-13-01T00:00:00", "yesterday", "2023-02-30"] {
            let err = parse(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn test_file_format_sorts_with_dates() {
        let dates = [ymd(2022, 12, 31), ymd(2023, 1, 5), ymd(2023, 1, 15), ymd(2023, 10, 2)];

        let formatted: Vec<String> = dates.iter().map(|d| format_for_file(*d)).collect();
        let mut sorted = formatted.clone();
        sorted.sort();

        assert_eq!(formatted, sorted);
        assert_eq!(formatted[1], "20230105");
    }

    #[test]
    fn test_record_styles() {
        let d = ymd(2023, 1, 5);

        assert_eq!(format_for_record(d), "01/05/2023");
        assert_eq!(RecordDateStyle::DayFirst.format(d), "05/01/2023");
        assert_eq!(RecordDateStyle::Iso.format(d), "2023-01-05");
    }
}
