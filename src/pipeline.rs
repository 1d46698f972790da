//! Refresh of one year: fetch the holiday rows, derive the calendar, replace
//! the stored year.

use crate::calendar::{build_holiday_index, check_year, YearCalendar, YearSummary};
use crate::config::Settings;
use crate::error::Result;
use crate::source::HolidaySource;
use crate::store::CalendarStore;
use tracing::{debug, info, warn};

/// Fetch `year` from `source`, apply the configured extra rows and derive the
/// calendar. Nothing is stored.
pub fn build_calendar(
    source: &dyn HolidaySource,
    year: i32,
    settings: &Settings,
) -> Result<YearCalendar> {
    check_year(year)?;
    let mut records = source.fetch(year)?;
    if records.is_empty() {
        warn!(source = source.name(), year, "no holiday rows, only weekends will be closed");
    }
    // appended last so local rows win on duplicate dates
    records.extend(settings.extra_holidays.iter().cloned());

    let index = build_holiday_index(&records, year);
    debug!(source = source.name(), year, special_days = index.len(), "holiday rows indexed");
    Ok(YearCalendar::from_index(year, &index)?)
}

/// Rebuild `year` from `source` and write it to `store` in one replacement.
pub fn refresh_year(
    source: &dyn HolidaySource,
    store: &dyn CalendarStore,
    year: i32,
    settings: &Settings,
) -> Result<YearSummary> {
    let (days, summary) = build_calendar(source, year, settings)?.into_parts();

    store.replace_year(year, &days, &summary)?;
    info!(
        source = source.name(),
        year,
        trading_days = summary.total_trading_days,
        "calendar year refreshed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::RawHolidayRecord;
    use crate::error::{Error, SourceError, StoreError, YearOutOfRange};
    use crate::source::{JsonFileSource, StaticSource};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn refresh_stores_rows_and_summary() {
        let source = StaticSource::new(vec![
            RawHolidayRecord::new("2025/12/31", "stale row"),
            RawHolidayRecord::new("2026/01/01", "開國紀念日"),
            RawHolidayRecord::new("2026/02/16", "農曆春節前最後交易日"),
        ]);
        let store = MemoryStore::new();
        let summary = refresh_year(&source, &store, 2026, &Settings::default()).unwrap();

        assert_eq!(summary.year, 2026);
        assert_eq!(summary.total_trading_days, 260);
        assert_eq!(store.summary(2026).unwrap(), Some(summary));
        let rows = store.rows(2026).unwrap().unwrap();
        assert_eq!(rows.len(), 365);
        let feb16 = rows.iter().find(|d| d.date == ymd(2026, 2, 16)).unwrap();
        assert_eq!(feb16.trading_day_index, 32);
    }

    #[test]
    fn extra_holidays_override_source() {
        let source = StaticSource::new(vec![RawHolidayRecord::new("2026/10/09", "A")]);
        let settings = Settings {
            extra_holidays: vec![RawHolidayRecord::new("2026-10-09", "國慶日前最後交易日")],
            ..Settings::default()
        };
        let store = MemoryStore::new();
        let summary = refresh_year(&source, &store, 2026, &settings).unwrap();
        assert_eq!(summary.total_trading_days, 261);
        let rows = store.rows(2026).unwrap().unwrap();
        let oct9 = rows.iter().find(|d| d.date == ymd(2026, 10, 9)).unwrap();
        assert!(oct9.is_trading_day());
        assert_eq!(oct9.annotation, "國慶日前最後交易日");
    }

    #[test]
    fn source_failure_leaves_store_untouched() {
        let source = JsonFileSource::new("/nonexistent/twsec/holidays.json");
        let store = MemoryStore::new();
        let err = refresh_year(&source, &store, 2026, &Settings::default()).unwrap_err();
        assert!(matches!(err, Error::Source(SourceError::Io(_))));
        assert!(store.years().unwrap().is_empty());
    }

    struct RejectingStore;

    impl CalendarStore for RejectingStore {
        fn replace_year(
            &self,
            year: i32,
            _rows: &[crate::calendar::DayRecord],
            _summary: &YearSummary,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Inconsistent {
                year,
                message: "read only".to_string(),
            })
        }
    }

    #[test]
    fn store_failure_is_reported() {
        let source = StaticSource::default();
        let err = refresh_year(&source, &RejectingStore, 2026, &Settings::default()).unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Inconsistent { .. })));
    }

    #[test]
    fn build_calendar_applies_extra_rows_without_storing() {
        let source = StaticSource::new(vec![RawHolidayRecord::new("2026/10/09", "A")]);
        let settings = Settings {
            extra_holidays: vec![RawHolidayRecord::new("2026/10/09", "B")],
            ..Settings::default()
        };
        let cal = build_calendar(&source, 2026, &settings).unwrap();
        let oct9 = cal.day(ymd(2026, 10, 9)).unwrap();
        assert_eq!(oct9.annotation, "B");
        assert_eq!(false, oct9.is_trading_day());
        assert_eq!(cal.summary().total_trading_days, 260);
    }

    #[test]
    fn unsupported_year_is_rejected_before_storing() {
        let store = MemoryStore::new();
        let err = refresh_year(&StaticSource::default(), &store, 300_000, &Settings::default())
            .unwrap_err();
        assert!(matches!(err, Error::Year(YearOutOfRange(300_000))));
        assert!(store.years().unwrap().is_empty());
    }
}
