//! Environment driven settings.
//!
//! `TWSEC_EXTRA_HOLIDAYS` holds a JSON list of holiday rows appended after
//! whatever the source delivers, either `[date, label]` pairs or
//! `{"date_text": .., "label": ..}` objects. Appended rows win on duplicate
//! dates. `TWSEC_OUTPUT_DIR` is the directory used by the JSON store.

use crate::calendar::RawHolidayRecord;
use crate::error::ConfigError;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const EXTRA_HOLIDAYS_VAR: &str = "TWSEC_EXTRA_HOLIDAYS";
pub const OUTPUT_DIR_VAR: &str = "TWSEC_OUTPUT_DIR";
pub const DEFAULT_OUTPUT_DIR: &str = "calendar-data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub extra_holidays: Vec<RawHolidayRecord>,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            extra_holidays: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExtraRow {
    Cells(Vec<String>),
    Record(RawHolidayRecord),
}

impl ExtraRow {
    fn into_record(self) -> Option<RawHolidayRecord> {
        match self {
            ExtraRow::Cells(cells) => {
                let mut cells = cells.into_iter();
                let date_text = cells.next()?;
                let label = cells.next().unwrap_or_default();
                Some(RawHolidayRecord { date_text, label })
            }
            ExtraRow::Record(record) => Some(record),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(EXTRA_HOLIDAYS_VAR) {
            if !raw.trim().is_empty() {
                let rows: Vec<ExtraRow> =
                    serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                        key: EXTRA_HOLIDAYS_VAR.to_string(),
                        message: e.to_string(),
                    })?;
                settings.extra_holidays = rows.into_iter().filter_map(ExtraRow::into_record).collect();
            }
        }

        if let Some(dir) = lookup(OUTPUT_DIR_VAR) {
            if dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: OUTPUT_DIR_VAR.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            settings.output_dir = PathBuf::from(dir);
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output_dir, PathBuf::from("calendar-data"));
    }

    #[test]
    fn extra_holidays_in_both_shapes() {
        let settings = Settings::from_lookup(lookup(&[(
            EXTRA_HOLIDAYS_VAR,
            r#"[["2026/09/28", "教師節"], {"date_text": "2026-10-25", "label": "臺灣光復節"}, {"date_text": "2026/12/25"}, ["2026/05/01"], []]"#,
        )]))
        .unwrap();
        assert_eq!(
            settings.extra_holidays,
            vec![
                RawHolidayRecord::new("2026/09/28", "教師節"),
                RawHolidayRecord::new("2026-10-25", "臺灣光復節"),
                RawHolidayRecord::new("2026/12/25", ""),
                RawHolidayRecord::new("2026/05/01", ""),
            ]
        );
    }

    #[test]
    fn invalid_extra_holidays() {
        let err = Settings::from_lookup(lookup(&[(EXTRA_HOLIDAYS_VAR, "{oops")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == EXTRA_HOLIDAYS_VAR));
    }

    #[test]
    fn output_dir_override() {
        let settings = Settings::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "/tmp/twsec")])).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/twsec"));
        assert!(Settings::from_lookup(lookup(&[(OUTPUT_DIR_VAR, " ")])).is_err());
    }
}
