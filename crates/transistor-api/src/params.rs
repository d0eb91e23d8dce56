//! Analytics request parameter types.

use chrono::NaiveDate;

use crate::error::{Result, TransistorError};

/// Date format used by the analytics endpoints (`dd-mm-yyyy`).
const DATE_FORMAT: &str = "%d-%m-%Y";

/// Optional `start_date` / `end_date` filter for analytics requests.
///
/// Omitted bounds are not sent; the server then falls back to its own
/// recent window (14 days, or 7 days for the all-episodes report).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First day included.
    pub start: Option<NaiveDate>,
    /// Last day included.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a range with both bounds set.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parses optional `dd-mm-yyyy` strings.
    ///
    /// # Errors
    ///
    /// Returns [`TransistorError::Config`] if a string is not a valid
    /// `dd-mm-yyyy` date.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: start.map(parse_date).transpose()?,
            end: end.map(parse_date).transpose()?,
        })
    }

    /// Renders the range as query parameters.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(2);
        if let Some(start) = self.start {
            query.push(("start_date", start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = self.end {
            query.push(("end_date", end.format(DATE_FORMAT).to_string()));
        }
        query
    }
}

/// Parses a single `dd-mm-yyyy` date.
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| TransistorError::Config(format!("invalid date (expected dd-mm-yyyy): {s}")))
}
