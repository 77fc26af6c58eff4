//! Date keys for redirect rules and the day a dispatcher evaluates against.
//!
//! Three textual shapes are understood, all fixed-width digit groups joined by
//! hyphens:
//! - `MM-DD` (recurring, matches that day in any year)
//! - `MM-DD-YYYY` (exact)
//! - `YYYY-MM-DD` (exact, ISO order)
//!
//! Calendar validity is checked by rebuilding the date with chrono and reading
//! the components back, so `02-30`, `04-31` and `13-01` are all rejected.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Recurring keys have no year. They are validated against a leap year so that
/// `02-29` stays a usable recurring key.
const RECURRING_BASE_YEAR: i32 = 2000;

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// Textual date scheme a dispatcher runs with.
///
/// Selects the shape `simulate-date` must have and how "today" is rendered in
/// diagnostics. Rule keys may use any of the three shapes regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateFormat {
    /// `MM-DD`
    Recurring,
    /// `MM-DD-YYYY`
    MonthDayYear,
    /// `YYYY-MM-DD`
    #[default]
    Iso,
}

impl DateFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Recurring => "MM-DD",
            Self::MonthDayYear => "MM-DD-YYYY",
            Self::Iso => "YYYY-MM-DD",
        }
    }

    fn shape(self) -> Shape {
        match self {
            Self::Recurring => Shape::MonthDay,
            Self::MonthDayYear => Shape::MonthDayYear,
            Self::Iso => Shape::YearMonthDay,
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateKeyError {
    #[error("'{0}' does not match MM-DD, MM-DD-YYYY or YYYY-MM-DD")]
    Shape(String),
    #[error("'{input}' does not match the {format} date format")]
    WrongFormat { input: String, format: DateFormat },
    #[error("'{0}' is not a calendar date")]
    Calendar(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    MonthDay,
    MonthDayYear,
    YearMonthDay,
}

/// Components pulled out of a correctly shaped date string. Not yet validated.
#[derive(Debug, Clone, Copy)]
struct RawDate {
    shape: Shape,
    year: Option<i32>,
    month: u32,
    day: u32,
}

fn split_components(input: &str) -> Option<RawDate> {
    let groups: Vec<&str> = input.split('-').collect();
    if !groups
        .iter()
        .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let widths: Vec<usize> = groups.iter().map(|group| group.len()).collect();
    let number = |group: &str| group.parse::<u32>().ok();

    match widths.as_slice() {
        [2, 2] => Some(RawDate {
            shape: Shape::MonthDay,
            year: None,
            month: number(groups[0])?,
            day: number(groups[1])?,
        }),
        [2, 2, 4] => Some(RawDate {
            shape: Shape::MonthDayYear,
            year: Some(groups[2].parse().ok()?),
            month: number(groups[0])?,
            day: number(groups[1])?,
        }),
        [4, 2, 2] => Some(RawDate {
            shape: Shape::YearMonthDay,
            year: Some(groups[0].parse().ok()?),
            month: number(groups[1])?,
            day: number(groups[2])?,
        }),
        _ => None,
    }
}

/// Rebuild a calendar date and require that it reads back identically.
fn reconstruct(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    (date.year() == year && date.month() == month && date.day() == day).then_some(date)
}

impl RawDate {
    fn validate(self, input: &str) -> Result<DateKey, DateKeyError> {
        let calendar_error = || DateKeyError::Calendar(input.to_string());
        match self.year {
            Some(year) => reconstruct(year, self.month, self.day)
                .map(DateKey::Exact)
                .ok_or_else(calendar_error),
            None => reconstruct(RECURRING_BASE_YEAR, self.month, self.day)
                .map(|_| DateKey::Recurring {
                    month: self.month,
                    day: self.day,
                })
                .ok_or_else(calendar_error),
        }
    }
}

/// Normalized rule key. Both exact shapes collapse to the same `Exact` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateKey {
    Exact(NaiveDate),
    Recurring { month: u32, day: u32 },
}

impl DateKey {
    /// Parse a key in any of the supported shapes.
    pub fn parse(input: &str) -> Result<Self, DateKeyError> {
        split_components(input)
            .ok_or_else(|| DateKeyError::Shape(input.to_string()))?
            .validate(input)
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Recurring { month, day } => write!(f, "{month:02}-{day:02}"),
        }
    }
}

/// True when `input` has one of the supported shapes and names a real day.
pub fn is_valid_date(input: &str) -> bool {
    DateKey::parse(input).is_ok()
}

/// The day a dispatcher evaluates rules against.
///
/// A simulated `MM-DD` day has no year and can only match recurring keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationDay {
    year: Option<i32>,
    month: u32,
    day: u32,
}

impl EvaluationDay {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Parse a day written in `format`. Any other shape is rejected even if
    /// it would be a valid rule key.
    pub fn parse(input: &str, format: DateFormat) -> Result<Self, DateKeyError> {
        let raw = split_components(input).ok_or_else(|| DateKeyError::Shape(input.to_string()))?;
        if raw.shape != format.shape() {
            return Err(DateKeyError::WrongFormat {
                input: input.to_string(),
                format,
            });
        }

        Ok(match raw.validate(input)? {
            DateKey::Exact(date) => Self::from_date(date),
            DateKey::Recurring { month, day } => Self {
                year: None,
                month,
                day,
            },
        })
    }

    pub fn exact_key(&self) -> Option<DateKey> {
        let year = self.year?;
        NaiveDate::from_ymd_opt(year, self.month, self.day).map(DateKey::Exact)
    }

    pub fn recurring_key(&self) -> DateKey {
        DateKey::Recurring {
            month: self.month,
            day: self.day,
        }
    }

    pub fn format(&self, format: DateFormat) -> String {
        match (format, self.year) {
            (DateFormat::MonthDayYear, Some(year)) => {
                format!("{:02}-{:02}-{year:04}", self.month, self.day)
            }
            (DateFormat::Iso, Some(year)) => format!("{year:04}-{:02}-{:02}", self.month, self.day),
            _ => format!("{:02}-{:02}", self.month, self.day),
        }
    }
}
