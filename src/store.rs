//! Calendar stores: where computed years are persisted.

use crate::calendar::{DayRecord, YearSummary};
use crate::error::StoreError;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::debug;

/// Persistence contract for computed years.
///
/// `replace_year` must act as one unit: prior rows and the prior summary of
/// `year` are removed and the new ones written, with no reader or concurrent
/// writer observing a mix.
pub trait CalendarStore: Send + Sync {
    fn replace_year(
        &self,
        year: i32,
        rows: &[DayRecord],
        summary: &YearSummary,
    ) -> Result<(), StoreError>;
}

/// Rows and summary of one year as persisted.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredYear {
    pub summary: YearSummary,
    pub days: Vec<DayRecord>,
}

fn check_rows(year: i32, rows: &[DayRecord], summary: &YearSummary) -> Result<(), StoreError> {
    if summary.year != year {
        return Err(StoreError::Inconsistent {
            year,
            message: format!("summary is for {}", summary.year),
        });
    }
    if let Some(stray) = rows.iter().find(|d| d.date.year() != year) {
        return Err(StoreError::Inconsistent {
            year,
            message: format!("row dated {}", stray.date),
        });
    }
    Ok(())
}

/// In-process store. Each replacement happens under a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    years: Mutex<BTreeMap<i32, StoredYear>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<i32, StoredYear>>, StoreError> {
        self.years.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Rows of `year`, `Ok(None)` if it was never stored.
    pub fn rows(&self, year: i32) -> Result<Option<Vec<DayRecord>>, StoreError> {
        Ok(self.lock()?.get(&year).map(|y| y.days.clone()))
    }

    pub fn summary(&self, year: i32) -> Result<Option<YearSummary>, StoreError> {
        Ok(self.lock()?.get(&year).map(|y| y.summary))
    }

    /// Years currently held, ascending.
    pub fn years(&self) -> Result<Vec<i32>, StoreError> {
        Ok(self.lock()?.keys().copied().collect())
    }
}

impl CalendarStore for MemoryStore {
    fn replace_year(
        &self,
        year: i32,
        rows: &[DayRecord],
        summary: &YearSummary,
    ) -> Result<(), StoreError> {
        check_rows(year, rows, summary)?;
        self.lock()?.insert(
            year,
            StoredYear {
                summary: *summary,
                days: rows.to_vec(),
            },
        );
        Ok(())
    }
}

/// One JSON document per year, `<dir>/calendar_<year>.json`.
///
/// Every write goes to its own temporary file in `dir`, which is then renamed
/// over the target. Concurrent writers of one year end with exactly one of
/// their documents in place.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> JsonDirStore {
        JsonDirStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        self.dir.join(format!("calendar_{year}.json"))
    }

    /// Read a previously stored year, `None` if it was never written.
    pub fn load_year(&self, year: i32) -> Result<Option<StoredYear>, StoreError> {
        let path = self.path_for(year);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl CalendarStore for JsonDirStore {
    fn replace_year(
        &self,
        year: i32,
        rows: &[DayRecord],
        summary: &YearSummary,
    ) -> Result<(), StoreError> {
        check_rows(year, rows, summary)?;
        fs::create_dir_all(&self.dir)?;

        let stored = StoredYear {
            summary: *summary,
            days: rows.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;

        let target = self.path_for(year);
        tmp.persist(&target).map_err(|e| e.error)?;
        debug!(path = %target.display(), rows = rows.len(), "calendar year written");
        Ok(())
    }
}
