//! Derivation of the Taiwan stock exchange trading calendar.
//!
//! A year is built from the holiday schedule published by the exchange: every
//! calendar day gets its trading-day index (or [`NON_TRADING`]) and the label
//! the exchange attached to it, if any.

use crate::error::YearOutOfRange;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::debug;

/// Label fragments marking a listed day that is still a regular session,
/// e.g. `農曆春節前最後交易日`. Matched as plain substrings.
pub const SESSION_MARKERS: [&str; 2] = ["開始交易", "最後交易"];

/// Trading-day index stored for days the exchange is closed.
pub const NON_TRADING: i32 = -1;

/// Years a calendar can be built for, the same range `parse_date` accepts.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// Fails for years outside [`SUPPORTED_YEARS`].
pub fn check_year(year: i32) -> Result<i32, YearOutOfRange> {
    if SUPPORTED_YEARS.contains(&year) {
        Ok(year)
    } else {
        Err(YearOutOfRange(year))
    }
}

/// A holiday row exactly as delivered by the upstream schedule.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RawHolidayRecord {
    pub date_text: String,
    #[serde(default)]
    pub label: String,
}

impl RawHolidayRecord {
    pub fn new(date_text: impl Into<String>, label: impl Into<String>) -> RawHolidayRecord {
        RawHolidayRecord {
            date_text: date_text.into(),
            label: label.into(),
        }
    }
}

/// A raw record whose date text has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayDate {
    pub date: NaiveDate,
    pub label: String,
}

impl HolidayDate {
    /// Returns `None` when the record's date text is not a real date.
    pub fn from_raw(raw: &RawHolidayRecord) -> Option<HolidayDate> {
        parse_date(&raw.date_text).map(|date| HolidayDate {
            date,
            label: raw.label.clone(),
        })
    }
}

/// Parse `YYYY/MM/DD` or `YYYY-MM-DD`, surrounding whitespace allowed.
///
/// `/` takes precedence when the text contains both separators. Anything that
/// is not exactly three integer parts forming a real date (years 1 to 9999)
/// yields `None`; this never fails loudly.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let sep = if text.contains('/') {
        '/'
    } else if text.contains('-') {
        '-'
    } else {
        return None;
    };

    let parts: Vec<&str> = text.split(sep).collect();
    if parts.len() != 3 {
        return None;
    }

    let year: i32 = parts[0].trim().parse().ok()?;
    let month: u32 = parts[1].trim().parse().ok()?;
    let day: u32 = parts[2].trim().parse().ok()?;
    check_year(year).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Labelled days of one year, one label per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayIndex {
    labels: BTreeMap<NaiveDate, String>,
}

impl HolidayIndex {
    pub fn get(&self, date: NaiveDate) -> Option<&str> {
        self.labels.get(&date).map(String::as_str)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.labels.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labelled dates in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.labels.iter().map(|(date, label)| (*date, label.as_str()))
    }
}

/// Build the index of labelled days for `year` from unfiltered raw records.
///
/// Unparseable rows and rows of other years are skipped. When a date occurs
/// more than once the later record wins.
pub fn build_holiday_index(records: &[RawHolidayRecord], year: i32) -> HolidayIndex {
    let mut labels = BTreeMap::new();
    for raw in records {
        match HolidayDate::from_raw(raw) {
            Some(holiday) if holiday.date.year() == year => {
                if let Some(previous) = labels.insert(holiday.date, holiday.label) {
                    debug!(date = %holiday.date, %previous, "duplicate holiday record, later label kept");
                }
            }
            Some(holiday) => {
                debug!(date = %holiday.date, year, "holiday record outside target year skipped");
            }
            None => {
                debug!(date_text = %raw.date_text, label = %raw.label, "unparseable holiday record dropped");
            }
        }
    }
    debug!(year, count = labels.len(), "holiday index built");
    HolidayIndex { labels }
}

/// Why a day is open or closed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    /// Plain weekday session.
    Regular,
    /// Listed by the exchange, but the label marks a first or last session.
    SessionNote,
    /// Listed by the exchange as closed.
    Holiday,
    Weekend,
}

impl DayKind {
    pub fn is_trading(self) -> bool {
        matches!(self, DayKind::Regular | DayKind::SessionNote)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: DayKind,
    /// Holiday label, empty for unlisted days.
    pub annotation: String,
}

impl Classification {
    pub fn is_trading(&self) -> bool {
        self.kind.is_trading()
    }
}

/// Returns true if a holiday label denotes an open session.
pub fn is_session_note(label: &str) -> bool {
    SESSION_MARKERS.iter().any(|marker| label.contains(marker))
}

/// Classify a single day.
///
/// A listed day is closed unless its label carries one of the
/// [`SESSION_MARKERS`]; this check comes before the weekend rule. Unlisted
/// days are closed on Saturday and Sunday and open otherwise.
pub fn classify_day(date: NaiveDate, index: &HolidayIndex) -> Classification {
    if let Some(label) = index.get(date) {
        let kind = if is_session_note(label) {
            DayKind::SessionNote
        } else {
            DayKind::Holiday
        };
        return Classification {
            kind,
            annotation: label.to_string(),
        };
    }
    let kind = match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayKind::Weekend,
        _ => DayKind::Regular,
    };
    Classification {
        kind,
        annotation: String::new(),
    }
}

/// One calendar day of a computed year.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub date: NaiveDate,
    /// 1-based position among the year's trading days, [`NON_TRADING`] when closed.
    pub trading_day_index: i32,
    pub annotation: String,
}

impl DayRecord {
    pub fn is_trading_day(&self) -> bool {
        self.trading_day_index != NON_TRADING
    }

    pub fn trading_index(&self) -> Option<u32> {
        u32::try_from(self.trading_day_index).ok()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i32,
    pub total_trading_days: u32,
}

/// Walk every day of `year` in order, numbering the trading days from 1.
pub fn build_year(
    year: i32,
    index: &HolidayIndex,
) -> Result<(Vec<DayRecord>, YearSummary), YearOutOfRange> {
    check_year(year)?;
    let mut days = Vec::with_capacity(days_in_year(year) as usize);
    let mut trading_days: i32 = 0;

    for month in 1..=12 {
        for day in 1..=last_day_of_month(year, month) {
            let date =
                NaiveDate::from_ymd_opt(year, month, day).ok_or(YearOutOfRange(year))?;
            let class = classify_day(date, index);
            let trading_day_index = if class.is_trading() {
                trading_days += 1;
                trading_days
            } else {
                NON_TRADING
            };
            days.push(DayRecord {
                date,
                trading_day_index,
                annotation: class.annotation,
            });
        }
    }

    let summary = YearSummary {
        year,
        total_trading_days: trading_days as u32,
    };
    Ok((days, summary))
}

/// A fully computed trading calendar for one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearCalendar {
    days: Vec<DayRecord>,
    summary: YearSummary,
}

impl YearCalendar {
    /// Build the calendar of `year` from unfiltered raw holiday records.
    pub fn build(year: i32, records: &[RawHolidayRecord]) -> Result<YearCalendar, YearOutOfRange> {
        check_year(year)?;
        let index = build_holiday_index(records, year);
        YearCalendar::from_index(year, &index)
    }

    pub fn from_index(year: i32, index: &HolidayIndex) -> Result<YearCalendar, YearOutOfRange> {
        let (days, summary) = build_year(year, index)?;
        Ok(YearCalendar { days, summary })
    }

    pub fn year(&self) -> i32 {
        self.summary.year
    }

    pub fn summary(&self) -> &YearSummary {
        &self.summary
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn into_parts(self) -> (Vec<DayRecord>, YearSummary) {
        (self.days, self.summary)
    }

    fn position(&self, date: NaiveDate) -> Option<usize> {
        if date.year() != self.year() {
            return None;
        }
        let pos = date.ordinal0() as usize;
        (pos < self.days.len()).then_some(pos)
    }

    /// The row for `date`, `None` outside this calendar's year.
    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.position(date).map(|pos| &self.days[pos])
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.day(date).map_or(false, DayRecord::is_trading_day)
    }

    /// Calculate the next trading day within the year
    pub fn next_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let pos = self.position(date)?;
        self.days[pos + 1..]
            .iter()
            .find(|d| d.is_trading_day())
            .map(|d| d.date)
    }

    /// Calculate the previous trading day within the year
    pub fn prev_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let pos = self.position(date)?;
        self.days[..pos]
            .iter()
            .rev()
            .find(|d| d.is_trading_day())
            .map(|d| d.date)
    }

    /// Date of the `n`-th trading day (1-based).
    pub fn nth_trading_day(&self, n: u32) -> Option<NaiveDate> {
        if n == 0 || n > self.summary.total_trading_days {
            return None;
        }
        self.days
            .iter()
            .find(|d| d.trading_index() == Some(n))
            .map(|d| d.date)
    }

    /// Trading days in `from..=to`, clamped to this year.
    pub fn trading_days_between(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        self.days
            .iter()
            .filter(|d| d.date >= from && d.date <= to && d.is_trading_day())
            .count() as u32
    }

    /// Days carrying an exchange label, open or closed.
    pub fn special_days(&self) -> impl Iterator<Item = &DayRecord> {
        self.days.iter().filter(|d| !d.annotation.is_empty())
    }
}

/// Returns true if the specified year is a leap year (proleptic Gregorian rule)
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Calculate the last day of a given month in a given year
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
