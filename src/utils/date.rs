use chrono::{Datelike, Duration, Months, NaiveDate};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum DateParseError {
    #[error("date '{0}' has surrounding whitespace")]
    Whitespace(String),
    #[error("date '{0}' does not start with a four-digit year")]
    Year(String),
    #[error("date '{input}' is not in YYYY-MM-DD format: {source}")]
    Format {
        input: String,
        source: chrono::ParseError,
    },
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// Callers decide what a failure means: the list endpoint drops the filter,
/// the path endpoints answer with an empty list.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    if input.trim() != input {
        return Err(DateParseError::Whitespace(input.to_string()));
    }
    // chrono's %Y also takes short and signed years
    let year = input.split('-').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateParseError::Year(input.to_string()));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|source| DateParseError::Format {
        input: input.to_string(),
        source,
    })
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Week that starts on the most recent Sunday on or before `end`.
///
/// `None` only when the start would fall before the earliest representable date.
pub fn week_window(end: NaiveDate) -> Option<DateWindow> {
    let weekday = end.weekday().num_days_from_monday();
    let days_since_sunday = (weekday + 1) % 7;
    let start = end.checked_sub_signed(Duration::days(i64::from(days_since_sunday)))?;
    Some(DateWindow { start, end })
}

/// Calendar month containing `day`.
pub fn month_window(day: NaiveDate) -> Option<DateWindow> {
    let first_day = day.with_day(1)?;
    let last_day = if day.month() == 12 {
        day.with_day(31)?
    } else {
        first_day.checked_add_months(Months::new(1))?.pred_opt()?
    };
    Some(DateWindow {
        start: first_day,
        end: last_day,
    })
}
