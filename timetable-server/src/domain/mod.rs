//! Domain types for the timetable.
//!
//! This module contains the validated value types that the timetable index,
//! association resolution and gathers are built from. All types enforce
//! their invariants at construction time.

mod activity;
mod calendar;
mod error;
mod operator;
mod service_uid;
mod station;
mod stp;
mod time;

pub use activity::{Activities, Activity};
pub use calendar::{
    BankHolidayPolicy, BankHolidays, Calendar, CalendarError, CalendarInterner, DayMask, LOOKUP_DAYS,
};
pub use error::{ResolveError, ScheduleError};
pub use operator::{InvalidToc, Toc};
pub use service_uid::{
    InvalidRetailServiceId, InvalidTimetableUid, RetailServiceId, TimetableUid,
};
pub use station::{Crs, InvalidCrs, InvalidTiploc, Tiploc};
pub use stp::{InvalidStpIndicator, StpIndicator};
pub use time::{ScheduleTime, TimeError, assign_day_offsets};
