//! Date handling for journal entries.
//!
//! Entry paths and display strings are produced from a configurable layout.
//! Layouts are written with the reference date `2006-01-02` (Monday, January 2,
//! 2006): every piece of that date appearing in the layout is replaced by the
//! corresponding piece of the rendered date, everything else is copied as-is.
//! A layout containing `%` is taken to be a strftime pattern instead.
//! Time-of-day tokens (`15`, `03`, `04`, `05`, `PM`) render midnight.
//!
//! Dates are always extracted from file names in the canonical `yyyy-mm-dd`
//! shape, independently of the configured layouts.

use crate::constants::{DATE_FORMAT_ISO, DATE_IN_FILENAME_PATTERN};
use crate::errors::DateError;
use chrono::{Local, NaiveDate, NaiveTime};
use std::fmt;
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static DATE_IN_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DATE_IN_FILENAME_PATTERN).expect("date pattern is a valid regex")
});

/// Reference-layout tokens and their strftime equivalents.
///
/// Longer tokens must come before their prefixes (`January` before `Jan`,
/// `2006` before `2`, `002` before `02`). `Jan` and `Mon` only count when no
/// lowercase letter follows, so `Monthly` stays literal.
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("2006", "%Y"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("_2", "%e"),
    ("15", "%H"),
    ("PM", "%p"),
    ("1", "%-m"),
    ("2", "%-d"),
];

/// A compiled date layout, ready to render dates.
///
/// # Examples
///
/// ```
/// use daybook::dates::DateLayout;
/// use chrono::NaiveDate;
///
/// let layout = DateLayout::new("2006/01/2006-01-02.md");
/// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(layout.format(date), "2024/03/2024-03-05.md");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLayout {
    strftime: String,
}

impl DateLayout {
    /// Compiles a layout string.
    pub fn new(layout: &str) -> Self {
        let strftime = if layout.contains('%') {
            layout.to_string()
        } else {
            translate_reference_layout(layout)
        };
        DateLayout { strftime }
    }

    /// Renders `date` with this layout, at midnight.
    ///
    /// Rendering stops at the first unsupported specifier; see [`Self::is_valid`].
    pub fn format(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        let _ = self.write_to(&mut out, date);
        out
    }

    /// Whether every specifier in the layout renders for a calendar date.
    ///
    /// Unknown specifiers and ones needing a time zone (`%z`, `%Z`) fail.
    pub fn is_valid(&self) -> bool {
        let sample = NaiveDate::from_ymd_opt(2006, 1, 2).unwrap_or_default();
        self.write_to(&mut String::new(), sample).is_ok()
    }

    fn write_to(&self, out: &mut String, date: NaiveDate) -> fmt::Result {
        let moment = date.and_time(NaiveTime::MIN);
        write!(out, "{}", moment.format(&self.strftime))
    }

    /// Whether distinct dates always render to distinct strings.
    ///
    /// True when the layout carries the year together with either the
    /// day of the year or both month and day of the month.
    pub fn is_unique_per_day(&self) -> bool {
        let has = |specs: &[&str]| specs.iter().any(|s| self.strftime.contains(s));
        let year = has(&["%Y", "%y", "%C", "%G", "%F"]);
        let day_of_year = has(&["%j", "%F"]);
        let month = has(&["%m", "%-m", "%b", "%B", "%h", "%F"]);
        let day = has(&["%d", "%-d", "%e", "%F"]);
        year && (day_of_year || (month && day))
    }
}

fn translate_reference_layout(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'outer: while !rest.is_empty() {
        for (token, spec) in LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                if matches!(*token, "Jan" | "Mon") && tail.starts_with(|c: char| c.is_ascii_lowercase()) {
                    continue;
                }
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// Renders `date` with `pattern` (a reference layout or strftime pattern).
pub fn path_for(date: NaiveDate, pattern: &str) -> String {
    DateLayout::new(pattern).format(date)
}

/// Formats a date in the canonical `yyyy-mm-dd` shape.
pub fn format(date: NaiveDate) -> String {
    date.format(DATE_FORMAT_ISO).to_string()
}

/// Parses an exact `yyyy-mm-dd` string.
///
/// # Errors
///
/// Returns `DateError::InvalidFormat` for any other shape or for
/// out-of-range months and days.
///
/// # Examples
///
/// ```
/// use daybook::dates;
///
/// let date = dates::parse("2024-02-29").unwrap();
/// assert_eq!(dates::format(date), "2024-02-29");
/// assert!(dates::parse("2023-02-29").is_err());
/// assert!(dates::parse("2024-1-5").is_err());
/// ```
pub fn parse(input: &str) -> Result<NaiveDate, DateError> {
    let invalid = || DateError::InvalidFormat {
        input: input.to_string(),
    };
    let bytes = input.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT_ISO).map_err(|_| invalid())
}

/// Extracts the date from the first `yyyy-mm-dd` substring of a file name.
///
/// # Errors
///
/// Returns `DateError::NotFound` when no such substring exists and
/// `DateError::InvalidFormat` when the first one is not a real date.
pub fn date_from_filename(filename: &str) -> Result<NaiveDate, DateError> {
    match DATE_IN_FILENAME.find(filename) {
        Some(found) => parse(found.as_str()),
        None => Err(DateError::NotFound {
            filename: filename.to_string(),
        }),
    }
}

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
