//! Error types for the trading activity library

use crate::config::ConfigError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Trading calendar source unreachable or empty
    #[error("Failed to fetch trading calendar: {0}")]
    CalendarFetch(String),

    /// Volume observation source unreachable or unreadable
    #[error("Failed to fetch volume observations: {0}")]
    ObservationFetch(String),

    /// Event window reaches beyond the fetched calendar
    #[error("Window [{start}, {end}) around {anchor} exceeds calendar bounds")]
    OutOfRange {
        anchor: NaiveDate,
        start: i32,
        end: i32,
    },

    /// Transaction date lies before the first or after the last trading day
    #[error("Date {date} lies outside the calendar span {first}..={last}")]
    OutsideCalendar {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    /// Output file or directory could not be written
    #[error("Failed to write {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CSV encoding/decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    /// Wrap an IO error raised while writing `path`
    pub fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::OutputWrite {
            path: path.into(),
            source,
        }
    }

    /// Whether the error aborts the whole batch rather than a single event
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AnalysisError::OutOfRange { .. } | AnalysisError::OutsideCalendar { .. }
        )
    }
}
