//! Time bounds for the timestamp window.
//!
//! Accepted forms:
//! - `ts:<float>`: seconds since the Unix epoch (`ts:1700000000.5`)
//! - `YYYY[-M[-D[-H[-M[-S]]]]]`: a partial UTC date (`2024`, `2024-1`, `2024-01-31-12`)
//!
//! A partial date names a period. As a lower bound it means the first instant
//! of the period; as an upper bound, the last millisecond of it, so
//! `--before 2023` keeps everything published during 2023.

use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone, Utc};

/// Errors raised when parsing a time bound.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time '{input}': {reason}")]
pub struct TimeError {
    /// The value as given.
    pub input: String,
    /// What was wrong with it.
    pub reason: String,
}

impl TimeError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which end of a period a partial date resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// First instant of the period (lower bounds).
    Start,
    /// Last millisecond of the period (upper bounds).
    End,
}

/// Precision of a partial date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// Parse a time bound, resolving partial dates to the given edge.
///
/// # Errors
///
/// Returns a [`TimeError`] for anything that is neither `ts:<float>` nor a
/// valid partial date (year 1 or later).
pub fn parse_time(input: &str, edge: Edge) -> Result<DateTime<Utc>, TimeError> {
    let trimmed = input.trim();
    if let Some(raw) = trimmed.strip_prefix("ts:") {
        return parse_epoch_seconds(trimmed, raw);
    }

    let fields = trimmed
        .split('-')
        .map(|field| {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
                return Err(TimeError::new(input, format!("'{field}' is not a number")));
            }
            field
                .parse::<u32>()
                .map_err(|_| TimeError::new(input, format!("'{field}' is out of range")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let period = match fields.len() {
        1 => Period::Year,
        2 => Period::Month,
        3 => Period::Day,
        4 => Period::Hour,
        5 => Period::Minute,
        6 => Period::Second,
        _ => return Err(TimeError::new(input, "expected YYYY[-M[-D[-H[-M[-S]]]]]")),
    };

    let field = |i: usize, default: u32| fields.get(i).copied().unwrap_or(default);
    let year = i32::try_from(field(0, 0))
        .ok()
        .filter(|y| *y >= 1)
        .ok_or_else(|| TimeError::new(input, "year must be 1 or later"))?;

    let start = NaiveDate::from_ymd_opt(year, field(1, 1), field(2, 1))
        .and_then(|date| date.and_hms_opt(field(3, 0), field(4, 0), field(5, 0)))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| TimeError::new(input, "not a valid calendar date"))?;

    match edge {
        Edge::Start => Ok(start),
        Edge::End => {
            let next = match period {
                Period::Year => start.checked_add_months(Months::new(12)),
                Period::Month => start.checked_add_months(Months::new(1)),
                Period::Day => start.checked_add_signed(Duration::days(1)),
                Period::Hour => start.checked_add_signed(Duration::hours(1)),
                Period::Minute => start.checked_add_signed(Duration::minutes(1)),
                Period::Second => start.checked_add_signed(Duration::seconds(1)),
            };
            next.and_then(|next| next.checked_sub_signed(Duration::milliseconds(1)))
                .ok_or_else(|| TimeError::new(input, "date out of range"))
        }
    }
}

fn parse_epoch_seconds(input: &str, raw: &str) -> Result<DateTime<Utc>, TimeError> {
    let seconds = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| TimeError::new(input, format!("'{raw}' is not a number of seconds")))?;
    if !seconds.is_finite() {
        return Err(TimeError::new(input, "timestamp must be finite"));
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
        .ok_or_else(|| TimeError::new(input, "timestamp out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_epoch_seconds() {
        assert_eq!(
            parse_time("ts:1000", Edge::Start).unwrap(),
            DateTime::from_timestamp(1000, 0).unwrap()
        );
        assert_eq!(
            parse_time("ts:1.5", Edge::End).unwrap(),
            DateTime::from_timestamp_millis(1500).unwrap()
        );
    }

    #[test]
    fn test_partial_dates_start_of_period() {
        let new_year = utc(2024, 1, 1, 0, 0, 0);
        for input in ["2024", "2024-1", "2024-01", "2024-1-1", "2024-01-01", "2024-1-1-0-0-0"] {
            assert_eq!(parse_time(input, Edge::Start).unwrap(), new_year, "{input}");
        }
        assert_eq!(
            parse_time("2023-06-15-13-45", Edge::Start).unwrap(),
            utc(2023, 6, 15, 13, 45, 0)
        );
    }

    #[test]
    fn test_partial_dates_end_of_period() {
        let last_ms = |dt: DateTime<Utc>| dt - Duration::milliseconds(1);
        assert_eq!(
            parse_time("2023", Edge::End).unwrap(),
            last_ms(utc(2024, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_time("2024-02", Edge::End).unwrap(),
            last_ms(utc(2024, 3, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_time("2023-12-31", Edge::End).unwrap(),
            last_ms(utc(2024, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_time("2023-06-01-10", Edge::End).unwrap(),
            last_ms(utc(2023, 6, 1, 11, 0, 0))
        );
    }

    #[test]
    fn test_invalid_inputs() {
        for input in [
            "0", "-1", "ts:abc", "ts:2024-1", "", "2024-13", "2023-02-30", "2024-1-1-25",
            "2024/01/01", "2024-01-01T00:00", "1-2-3-4-5-6-7", "ts:inf",
        ] {
            assert!(parse_time(input, Edge::Start).is_err(), "{input} should fail");
        }
    }

    #[test]
    fn test_error_names_input() {
        let err = parse_time("ts:abc", Edge::Start).unwrap_err();
        assert_eq!(err.input, "ts:abc");
        assert!(err.to_string().starts_with("Invalid time 'ts:abc'"));
    }
}
