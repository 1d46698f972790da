//! Error types shared by the sources, stores and the refresh pipeline.
//!
//! The calendar engine itself never fails: malformed holiday rows are dropped,
//! not reported. Only the collaborators around it produce errors.

use std::io;
use thiserror::Error;

/// A calendar was requested for a year outside `1..=9999`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("year {0} is outside the supported range 1..=9999")]
pub struct YearOutOfRange(pub i32);

/// Errors raised while obtaining raw holiday records.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read holiday source: {0}")]
    Io(#[from] io::Error),

    #[error("holiday payload could not be decoded: {0}")]
    Decode(String),
}

/// Errors raised while persisting a computed year.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("calendar store i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("calendar store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Rows or summary handed to `replace_year` do not belong to that year.
    #[error("inconsistent data for year {year}: {message}")]
    Inconsistent { year: i32, message: String },

    #[error("calendar store lock poisoned")]
    Poisoned,
}

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Year(#[from] YearOutOfRange),
}

pub type Result<T> = std::result::Result<T, Error>;
