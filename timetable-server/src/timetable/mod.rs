//! Schedules, associations and the resolution engine.

mod association;
mod data;
mod resolved;
mod schedule;
mod service;


pub use association::{
    AddOutcome, Association, AssociationCategory, AssociationEnd, AssociationSet, DateIndicator,
    InvalidAssociationCode, shift_date,
};
pub use data::{AttachCounts, LookupStatus, TimetableData};
pub use resolved::{Endpoint, ResolvedAssociation, ResolvedService, ResolvedServiceStop};
pub use schedule::{LocationKind, Schedule, ScheduleDetails, ScheduleLocation, nth_index_at};
pub use service::{Resolution, Service};
