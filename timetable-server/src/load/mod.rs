//! Building the in-memory snapshot from the timetable archive.
//!
//! Loading is the only phase that writes. Once [`bootstrap`] returns, the
//! snapshot is immutable and shared by every query.

mod bootstrap;
mod builder;
mod error;
mod records;

pub use bootstrap::{Snapshot, bootstrap, load_archive, read_bank_holidays};
pub use builder::{LoadReport, TimetableBuilder};
pub use error::{LoadError, RecordError};
pub use records::{AssociationRecord, CalendarRecord, LocationRecord, Record, ScheduleRecord, StopRecord, parse_line};
