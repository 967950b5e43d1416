//! Load pipeline error types.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{CalendarError, ScheduleError};

/// A single record that could not be turned into domain values.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Line is not a valid record
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Fatal load failures. Any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive held no usable records
    #[error("{} is not a timetable archive: {invalid} invalid lines, no valid records", path.display())]
    WrongFormat { path: PathBuf, invalid: usize },

    #[error("invalid bank holiday file {}: {message}", path.display())]
    BankHolidays { path: PathBuf, message: String },

    #[error("load did not finish within {0:?}")]
    Timeout(Duration),

    #[error("load task failed: {0}")]
    TaskFailed(String),
}
