//! Taiwan stock exchange trading calendar.
//!
//! Feed the exchange's holiday schedule in, get one row per calendar day out:
//! the day's trading-day index within the year (`-1` when closed) and the
//! label the exchange gave it.
//!
//! ```
//! use twsec::calendar::{RawHolidayRecord, YearCalendar};
//!
//! let records = vec![
//!     RawHolidayRecord::new("2026/01/01", "開國紀念日"),
//!     RawHolidayRecord::new("2026/02/16", "農曆春節前最後交易日"),
//! ];
//! let cal = YearCalendar::build(2026, &records).unwrap();
//! assert_eq!(cal.records().len(), 365);
//! assert_eq!(cal.summary().total_trading_days, 260);
//! ```

pub mod calendar;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod store;

pub use calendar::{
    build_holiday_index, build_year, classify_day, parse_date, DayRecord, HolidayIndex,
    RawHolidayRecord, YearCalendar, YearSummary,
};
pub use error::{Error, Result, YearOutOfRange};
