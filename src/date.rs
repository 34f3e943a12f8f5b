//! Record-format date values
//!
//! Event dates are kept as the text the host loaded, and parsed on demand.
//! A value that does not parse is an integrity *finding* (see
//! [`Diagnosis::DateInvalid`](crate::inspector::Diagnosis::DateInvalid)), so
//! parsing returns a `Result` the inspector folds into a problem instead of
//! propagating.
//!
//! ## Accepted forms
//!
//! ```text
//! 1850                      exact year
//! MAR 1850                  month and year
//! 12 MAR 1850               full date
//! ABT 1850 / CAL / EST      approximations
//! BEF 1900 / AFT 1850       open ranges
//! BET 1850 AND 1860         closed range
//! FROM 1850 TO 1860         period (either end optional)
//! INT 1850 (as told)        interpreted date with phrase
//! 44 B.C.                   years before the common era
//! ```

use crate::error::{GedcheckError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Raw date value as stored on an event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateValue(String);

impl DateValue {
    /// Wrap a date string
    pub fn new(value: impl Into<String>) -> Self {
        DateValue(value.into())
    }

    /// The original text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no date was recorded
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parse the value into its structured form
    pub fn parse(&self) -> Result<ParsedDate> {
        ParsedDate::parse(&self.0)
    }

    /// Chronological year of the value, `None` when empty or unparsable
    pub fn year(&self) -> Option<i32> {
        self.parse().ok().and_then(|d| d.year())
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DateValue {
    fn from(value: &str) -> Self {
        DateValue::new(value)
    }
}

/// A single calendar point, possibly partial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePoint {
    /// Year; negative for years before the common era
    pub year: i32,
    /// Month 1..=12
    pub month: Option<u32>,
    /// Day of month
    pub day: Option<u32>,
}

/// Approximation qualifier on an exact date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approximation {
    /// `ABT`
    About,
    /// `CAL`
    Calculated,
    /// `EST`
    Estimated,
    /// `INT`
    Interpreted,
}

/// Structured form of a [`DateValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// Nothing recorded
    Empty,
    /// One point in time, optionally approximated
    Exact {
        /// Qualifier, if any
        approx: Option<Approximation>,
        /// The point itself
        point: DatePoint,
    },
    /// `BEF`, `AFT` or `BET .. AND ..`
    Range {
        /// Lower bound
        after: Option<DatePoint>,
        /// Upper bound
        before: Option<DatePoint>,
    },
    /// `FROM .. TO ..`
    Period {
        /// Start of the period
        from: Option<DatePoint>,
        /// End of the period
        to: Option<DatePoint>,
    },
}

impl ParsedDate {
    /// Parse a date string
    pub fn parse(text: &str) -> Result<Self> {
        let upper = text.trim().to_ascii_uppercase();
        let tokens: Vec<&str> = upper.split_whitespace().collect();
        let invalid = || GedcheckError::InvalidDate(text.trim().to_string());

        let Some((&head, rest)) = tokens.split_first() else {
            return Ok(ParsedDate::Empty);
        };

        let parsed = match head {
            "BET" => {
                let idx = rest.iter().position(|t| *t == "AND").ok_or_else(invalid)?;
                ParsedDate::Range {
                    after: Some(parse_point(&rest[..idx]).ok_or_else(invalid)?),
                    before: Some(parse_point(&rest[idx + 1..]).ok_or_else(invalid)?),
                }
            }
            "BEF" => ParsedDate::Range {
                after: None,
                before: Some(parse_point(rest).ok_or_else(invalid)?),
            },
            "AFT" => ParsedDate::Range {
                after: Some(parse_point(rest).ok_or_else(invalid)?),
                before: None,
            },
            "FROM" => match rest.iter().position(|t| *t == "TO") {
                Some(idx) => ParsedDate::Period {
                    from: Some(parse_point(&rest[..idx]).ok_or_else(invalid)?),
                    to: Some(parse_point(&rest[idx + 1..]).ok_or_else(invalid)?),
                },
                None => ParsedDate::Period {
                    from: Some(parse_point(rest).ok_or_else(invalid)?),
                    to: None,
                },
            },
            "TO" => ParsedDate::Period {
                from: None,
                to: Some(parse_point(rest).ok_or_else(invalid)?),
            },
            "ABT" | "CAL" | "EST" => {
                let approx = match head {
                    "ABT" => Approximation::About,
                    "CAL" => Approximation::Calculated,
                    _ => Approximation::Estimated,
                };
                ParsedDate::Exact {
                    approx: Some(approx),
                    point: parse_point(rest).ok_or_else(invalid)?,
                }
            }
            "INT" => {
                // the free-text phrase in parentheses is not part of the date
                let end = rest
                    .iter()
                    .position(|t| t.starts_with('('))
                    .unwrap_or(rest.len());
                ParsedDate::Exact {
                    approx: Some(Approximation::Interpreted),
                    point: parse_point(&rest[..end]).ok_or_else(invalid)?,
                }
            }
            _ => ParsedDate::Exact {
                approx: None,
                point: parse_point(&tokens).ok_or_else(invalid)?,
            },
        };

        if let ParsedDate::Range { after: Some(a), before: Some(b) }
        | ParsedDate::Period { from: Some(a), to: Some(b) } = parsed
        {
            if a.year > b.year {
                return Err(invalid());
            }
        }

        Ok(parsed)
    }

    /// Year used for chronological ordering
    ///
    /// Ranges and periods report their first known bound.
    pub fn year(&self) -> Option<i32> {
        match self {
            ParsedDate::Empty => None,
            ParsedDate::Exact { point, .. } => Some(point.year),
            ParsedDate::Range { after, before } => after.or(*before).map(|p| p.year),
            ParsedDate::Period { from, to } => from.or(*to).map(|p| p.year),
        }
    }
}

fn parse_point(tokens: &[&str]) -> Option<DatePoint> {
    let (tokens, bce) = match tokens.split_last() {
        Some((&"B.C." | &"BC" | &"BCE", head)) => (head, true),
        _ => (tokens, false),
    };

    let (day, month, year) = match tokens {
        [y] => (None, None, *y),
        [m, y] => (None, Some(parse_month(m)?), *y),
        [d, m, y] => (Some(parse_day(d)?), Some(parse_month(m)?), *y),
        _ => return None,
    };

    let year = parse_year(year)?;

    if let (Some(day), Some(month)) = (day, month) {
        // chrono's proleptic calendar rejects 31 APR, 29 FEB 1900, ...
        NaiveDate::from_ymd_opt(year, month, day)?;
    }

    Some(DatePoint {
        year: if bce { -year } else { year },
        month,
        day,
    })
}

fn parse_month(token: &str) -> Option<u32> {
    MONTHS.iter().position(|m| *m == token).map(|i| i as u32 + 1)
}

fn parse_day(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok().filter(|d| (1..=31).contains(d))
}

fn parse_year(token: &str) -> Option<i32> {
    // dual-dated years such as 1750/51 keep the first part
    let digits = token.split('/').next()?;
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|y| *y > 0)
}
