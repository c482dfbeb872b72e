use crate::config::WeekdayConvention;
use crate::error::{EtlError, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use polars::prelude::*;

/// Pattern accepted for accident weather timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cast text to a 32-bit integer, yielding None instead of an error.
///
/// Accepts an optional sign, digits, and an optional fractional part which is
/// truncated toward zero (`"33.8"` -> 33). Anything else, including empty
/// text, exponents and values outside the i32 range, maps to None.
pub fn lenient_int(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let magnitude: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

/// Parse a weather timestamp; malformed text yields None
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()
}

pub fn weekday_number(ts: &NaiveDateTime, convention: WeekdayConvention) -> i32 {
    let weekday = ts.weekday();
    let number = match convention {
        WeekdayConvention::Iso => weekday.number_from_monday(),
        WeekdayConvention::SundayFirst => weekday.number_from_sunday(),
    };
    number as i32
}

/// Calendar fields derived from one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarParts {
    pub hour: i32,
    pub month: i32,
    pub weekday: i32,
    pub year: i32,
}

impl CalendarParts {
    pub fn from_timestamp(ts: &NaiveDateTime, convention: WeekdayConvention) -> Self {
        Self {
            hour: ts.hour() as i32,
            month: ts.month() as i32,
            weekday: weekday_number(ts, convention),
            year: ts.year(),
        }
    }
}

/// Empty CSV fields are read as null
pub fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Borrow a column as text, failing when it is absent or not a string column
pub fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let column = df
        .column(name)
        .map_err(|e| EtlError::Execution(format!("Column {} not found: {}", name, e)))?;
    Ok(column.str()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_int_accepts_integers() {
        assert_eq!(lenient_int("42"), Some(42));
        assert_eq!(lenient_int(" -7 "), Some(-7));
        assert_eq!(lenient_int("+15"), Some(15));
    }

    #[test]
    fn test_lenient_int_truncates_decimals() {
        assert_eq!(lenient_int("33.8"), Some(33));
        assert_eq!(lenient_int("2.99"), Some(2));
        assert_eq!(lenient_int("-1.5"), Some(-1));
        assert_eq!(lenient_int(".5"), Some(0));
        assert_eq!(lenient_int("12."), Some(12));
    }

    #[test]
    fn test_lenient_int_nulls_on_malformed() {
        assert_eq!(lenient_int(""), None);
        assert_eq!(lenient_int("   "), None);
        assert_eq!(lenient_int("n/a"), None);
        assert_eq!(lenient_int("12abc"), None);
        assert_eq!(lenient_int("1e5"), None);
        assert_eq!(lenient_int("."), None);
        assert_eq!(lenient_int("-"), None);
        assert_eq!(lenient_int("1,000"), None);
        assert_eq!(lenient_int("3000000000"), None);
    }

    #[test]
    fn test_calendar_parts() {
        let ts = parse_timestamp("2020-01-15 13:45:00").unwrap();
        let iso = CalendarParts::from_timestamp(&ts, WeekdayConvention::Iso);
        assert_eq!(iso, CalendarParts { hour: 13, month: 1, weekday: 3, year: 2020 });

        let sunday_first = CalendarParts::from_timestamp(&ts, WeekdayConvention::SundayFirst);
        assert_eq!(sunday_first.weekday, 4);
    }

    #[test]
    fn test_parse_timestamp_rejects_other_formats() {
        assert!(parse_timestamp("2020-01-15").is_none());
        assert!(parse_timestamp("15/01/2020 13:45:00").is_none());
        assert!(parse_timestamp("2020-13-01 00:00:00").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp(" 2020-01-15 13:45:00").is_none());
        assert!(parse_timestamp("2020-01-15 13:45:00 ").is_none());
    }
}
