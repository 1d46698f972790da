//! Holiday sources: where raw holiday rows come from.
//!
//! A source only delivers rows. Filtering by year, date validation and
//! de-duplication are done by [`crate::calendar::build_holiday_index`].

use crate::calendar::RawHolidayRecord;
use crate::error::SourceError;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Upstream holiday schedule contract.
///
/// Must be object-safe so callers can hold a `Box<dyn HolidaySource>`.
pub trait HolidaySource: Send + Sync {
    /// Short name used in logs (e.g. `"json-file"`).
    fn name(&self) -> &'static str;

    /// Fetch the raw rows for `year`. Rows of other years may be included.
    fn fetch(&self, year: i32) -> Result<Vec<RawHolidayRecord>, SourceError>;
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawHolidayRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawHolidayRecord>) -> StaticSource {
        StaticSource { records }
    }
}

impl HolidaySource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch(&self, _year: i32) -> Result<Vec<RawHolidayRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

/// A holiday-schedule payload saved to disk, see [`decode_twse_payload`].
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileSource {
        JsonFileSource { path: path.into() }
    }
}

impl HolidaySource for JsonFileSource {
    fn name(&self) -> &'static str {
        "json-file"
    }

    fn fetch(&self, year: i32) -> Result<Vec<RawHolidayRecord>, SourceError> {
        let text = fs::read_to_string(&self.path)?;
        let records = decode_twse_payload(&text)?;
        if records.is_empty() {
            warn!(path = %self.path.display(), year, "holiday payload has no rows");
        }
        Ok(records)
    }
}

/// Decode the exchange's holiday-schedule JSON.
///
/// Accepts the full response object (`{"data": [[date, label, ...], ...]}`)
/// or a bare array of rows. Cell 0 is the date text, cell 1 the label; a
/// missing or non-string label becomes empty. Rows without a string date are
/// dropped.
pub fn decode_twse_payload(text: &str) -> Result<Vec<RawHolidayRecord>, SourceError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SourceError::Decode(e.to_string()))?;

    let rows: &[Value] = match &value {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(rows)) => rows.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                return Err(SourceError::Decode(format!(
                    "`data` must be an array, got {}",
                    kind_of(other)
                )))
            }
        },
        other => {
            return Err(SourceError::Decode(format!(
                "expected an object or array, got {}",
                kind_of(other)
            )))
        }
    };

    Ok(rows.iter().filter_map(decode_row).collect())
}

fn decode_row(row: &Value) -> Option<RawHolidayRecord> {
    let cells = match row {
        Value::Array(cells) => cells,
        other => {
            debug!(row = %other, "holiday row is not an array, dropped");
            return None;
        }
    };
    let date_text = match cells.first() {
        Some(Value::String(s)) => s.clone(),
        _ => {
            debug!(row = %row, "holiday row without a date string, dropped");
            return None;
        }
    };
    let label = match cells.get(1) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    Some(RawHolidayRecord { date_text, label })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn decode_full_response() {
        let payload = r#"{
            "queryYear": 115,
            "fields": ["日期", "名稱", "說明"],
            "data": [
                ["2026/01/01", "中華民國開國紀念日", "依規定放假1日。"],
                ["2026/01/02", "國曆新年開始交易日"],
                ["2026-02-16"]
            ]
        }"#;
        let records = decode_twse_payload(payload).unwrap();
        assert_eq!(
            records,
            vec![
                RawHolidayRecord::new("2026/01/01", "中華民國開國紀念日"),
                RawHolidayRecord::new("2026/01/02", "國曆新年開始交易日"),
                RawHolidayRecord::new("2026-02-16", ""),
            ]
        );
    }

    #[test]
    fn decode_bare_array_drops_bad_rows() {
        let payload = r#"[
            ["2026/10/10", "國慶日"],
            [20261010, "numeric date"],
            [null, "null date"],
            [],
            "not a row",
            ["2026/12/25", 7]
        ]"#;
        let records = decode_twse_payload(payload).unwrap();
        assert_eq!(
            records,
            vec![
                RawHolidayRecord::new("2026/10/10", "國慶日"),
                RawHolidayRecord::new("2026/12/25", ""),
            ]
        );
    }

    #[test]
    fn decode_missing_data_is_empty() {
        assert!(decode_twse_payload(r#"{"stat": "ok"}"#).unwrap().is_empty());
        assert!(decode_twse_payload(r#"{"data": null}"#).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_bad_json() {
        assert!(matches!(
            decode_twse_payload("{not json"),
            Err(SourceError::Decode(_))
        ));
        assert!(matches!(
            decode_twse_payload(r#"{"data": "x"}"#),
            Err(SourceError::Decode(_))
        ));
        assert!(matches!(decode_twse_payload("42"), Err(SourceError::Decode(_))));
    }

    #[test]
    fn json_file_source_reads_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data": [["2026/04/03", "兒童節"]]}}"#).unwrap();
        let source = JsonFileSource::new(file.path());
        assert_eq!(source.name(), "json-file");
        let records = source.fetch(2026).unwrap();
        assert_eq!(records, vec![RawHolidayRecord::new("2026/04/03", "兒童節")]);
    }

    #[test]
    fn json_file_source_missing_file() {
        let source = JsonFileSource::new("/nonexistent/twsec/holidays.json");
        assert!(matches!(source.fetch(2026), Err(SourceError::Io(_))));
    }

    #[test]
    fn static_source_returns_everything() {
        let source: Box<dyn HolidaySource> = Box::new(StaticSource::new(vec![
            RawHolidayRecord::new("2025/01/01", "old"),
            RawHolidayRecord::new("2026/01/01", "new"),
        ]));
        assert_eq!(source.fetch(2026).unwrap().len(), 2);
    }
}
