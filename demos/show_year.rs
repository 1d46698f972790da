use twsec::calendar::{RawHolidayRecord, YearCalendar};
/// example to show holidays as well as sessions the exchange labelled
use std::env::args;
fn main() {
    let args: Vec<String> = args().collect();
    if args.len() < 2 {
        panic!("Usage: {} year [date=label ...]", args[0]);
    }
    let year: i32 = args[1].parse().unwrap();
    let records: Vec<RawHolidayRecord> = args[2..]
        .iter()
        .map(|arg| match arg.split_once('=') {
            Some((date, label)) => RawHolidayRecord::new(date, label),
            None => RawHolidayRecord::new(arg.as_str(), ""),
        })
        .collect();
    let cal = YearCalendar::build(year, &records).unwrap();
    let mut holidays = Vec::new();
    let mut sessions = Vec::new();
    for d in cal.special_days() {
        if d.is_trading_day() {
            sessions.push((d.date, d.annotation.as_str()));
        } else {
            holidays.push((d.date, d.annotation.as_str()));
        }
    }
    println!("holidays: {:?}", holidays);
    println!("labelled sessions: {:?}", sessions);
    println!("trading days: {}", cal.summary().total_trading_days);
}
