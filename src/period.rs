//! Application period parsing.
//!
//! Period strings arrive in whatever shape the announcement publisher used:
//! a compact `YYYYMMDD`, a `start ~ end` range, or a single date in one of a
//! handful of separators. Anything else is classified as [`Unparseable`],
//! which is an expected outcome rather than an error.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::RecommendationRecord;

/// Values that mean "no single period applies" in the source data.
pub const PERIOD_SENTINELS: &[&str] = &["-", "varies per sub-program", "세부사업별 상이"];

const RANGE_SEPARATOR: char = '~';

static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8}$").expect("compact date pattern is valid"));

/// Start and end of an application window, calendar dates only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPeriod {
    pub start_date: NaiveDate,
    /// Equal to `start_date` for single-date periods. `None` only when the
    /// right half of a range could not be read.
    pub end_date: Option<NaiveDate>,
}

impl ParsedPeriod {
    fn single(date: NaiveDate) -> Self {
        Self {
            start_date: date,
            end_date: Some(date),
        }
    }
}

/// Why a period string produced no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unparseable {
    #[error("period is absent or blank")]
    Blank,
    #[error("period is a placeholder value")]
    Sentinel,
    #[error("period matches no known date format")]
    NoMatchingFormat,
}

/// How to read the two slash formats, which overlap for days 1-12.
///
/// `MonthFirst` tries `MM/DD/YYYY` before `DD/MM/YYYY` and is how existing
/// exports have always been read, so "03/04/2025" is March 4th. `DayFirst`
/// swaps the two. Either way the other pattern is still tried as a
/// fallback, so "25/12/2025" parses under both orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateFormat {
    Dashed,
    Dotted,
    MonthDayYear,
    DayMonthYear,
    Compact,
}

impl DateFormat {
    fn chain(order: DateOrder) -> [DateFormat; 5] {
        use DateFormat::*;
        match order {
            DateOrder::MonthFirst => [Dashed, Dotted, MonthDayYear, DayMonthYear, Compact],
            DateOrder::DayFirst => [Dashed, Dotted, DayMonthYear, MonthDayYear, Compact],
        }
    }

    fn parse(self, text: &str) -> Option<NaiveDate> {
        let pattern = match self {
            DateFormat::Dashed => "%Y-%m-%d",
            DateFormat::Dotted => "%Y.%m.%d",
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::Compact => return parse_compact(text),
        };
        NaiveDate::parse_from_str(text, pattern).ok()
    }
}

/// Reads `YYYYMMDD` by position. chrono's `%Y` is greedy, so the compact
/// shape can't go through `parse_from_str`. ASCII digits only: the byte
/// slicing below assumes one byte per character.
fn parse_compact(text: &str) -> Option<NaiveDate> {
    if !COMPACT_DATE.is_match(text) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse one free-form date, first matching format wins.
pub fn parse_date(text: &str, order: DateOrder) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DateFormat::chain(order)
        .into_iter()
        .find_map(|format| format.parse(text))
}

/// Parse a raw application period.
///
/// Shapes are tried in a fixed order: compact `YYYYMMDD`, then a range split
/// on the first `~`, then a single free-form date.
pub fn parse_period(raw: Option<&str>, order: DateOrder) -> Result<ParsedPeriod, Unparseable> {
    let text = raw.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(Unparseable::Blank);
    }
    if PERIOD_SENTINELS.contains(&text) {
        return Err(Unparseable::Sentinel);
    }

    if COMPACT_DATE.is_match(text) {
        return parse_compact(text)
            .map(ParsedPeriod::single)
            .ok_or(Unparseable::NoMatchingFormat);
    }

    if let Some((left, right)) = text.split_once(RANGE_SEPARATOR) {
        let start_date = parse_date(left, order).ok_or(Unparseable::NoMatchingFormat)?;
        let end_date = parse_date(right, order);
        if end_date.is_none() {
            debug!(period = text, "range end unreadable, keeping start only");
        }
        return Ok(ParsedPeriod {
            start_date,
            end_date,
        });
    }

    parse_date(text, order)
        .map(ParsedPeriod::single)
        .ok_or(Unparseable::NoMatchingFormat)
}

/// Parse the period of a record, logging why it was skipped if it was.
pub fn parse_record_period(
    record: &RecommendationRecord,
    order: DateOrder,
) -> Result<ParsedPeriod, Unparseable> {
    let parsed = parse_period(record.period_raw.as_deref(), order);
    if let Err(reason) = &parsed {
        debug!(
            company = %record.company_name,
            title = record.title.as_deref().unwrap_or_default(),
            %reason,
            "no usable application period"
        );
    }
    parsed
}
