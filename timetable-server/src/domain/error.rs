//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the timetable model. "Not found" lookups are not errors; they are
//! reported through status values.

use chrono::NaiveDate;

use super::{Tiploc, TimetableUid};

/// A schedule version that violates the stop list invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// Locations are not in ascending sequence order
    #[error("schedule {0}: locations are not in sequence order")]
    OutOfSequence(TimetableUid),

    /// A running schedule must start at an origin
    #[error("schedule {0}: first location is not an origin")]
    MissingOrigin(TimetableUid),

    /// A running schedule must end at a destination
    #[error("schedule {0}: last location is not a destination")]
    MissingDestination(TimetableUid),

    /// Origin or destination found somewhere other than the ends
    #[error("schedule {uid}: unexpected {kind} at {location}")]
    MisplacedTerminal {
        uid: TimetableUid,
        kind: &'static str,
        location: Tiploc,
    },
}

/// Failure materialising one service on one date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Shifting a date by a day offset left the calendar range
    #[error("date {date} shifted by {days} days is out of range")]
    DateOutOfRange { date: NaiveDate, days: i64 },

    /// A stop has no time that can be used for the requested board
    #[error("service {uid}: no usable time at {location}")]
    MissingTime { uid: TimetableUid, location: Tiploc },

    /// A stop index past the end of the stop list
    #[error("service {uid}: no stop at index {index}")]
    NoSuchStop { uid: TimetableUid, index: usize },
}
