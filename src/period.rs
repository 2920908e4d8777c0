//! Month-granular date helpers for the `MM-YYYY` wire token.
//!
//! Subscriptions are billed per calendar month, so every date that enters the
//! system is truncated to the first day of its month. Dates are calendar dates
//! with no timezone; they are interpreted as midnight UTC.

use chrono::{Datelike, Days, Months, NaiveDate};
use thiserror::Error;

const MONTH_TOKEN_FORMAT: &str = "%m-%Y";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("invalid month-year format {0:?}")]
    InvalidFormat(String),
}

/// Parses a `MM-YYYY` token into the first day of that month.
///
/// Only the exact shape is accepted: a two digit month, a dash, and a four
/// digit year. Surrounding whitespace is the caller's concern.
pub fn parse_month_token(value: &str) -> Result<NaiveDate, PeriodError> {
    let invalid = || PeriodError::InvalidFormat(value.to_string());

    let (month, year) = value.split_once('-').ok_or_else(invalid)?;
    if month.len() != 2
        || year.len() != 4
        || !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

pub fn format_month_token(date: NaiveDate) -> String {
    date.format(MONTH_TOKEN_FORMAT).to_string()
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last calendar day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date) + Months::new(1) - Days::new(1)
}
