//! Service groups: every STP version sharing one timetable UID.

use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::domain::{BankHolidays, Calendar, StpIndicator, Tiploc, TimetableUid};

use super::association::{AddOutcome, Association, AssociationSet};
use super::schedule::Schedule;

type VersionKey = (Reverse<StpIndicator>, Arc<Calendar>);

/// Which version of a service applies on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Runs(&'a Arc<Schedule>),
    /// A cancellation wins. `cancels` is the highest-priority running
    /// version it suppresses, if any.
    Cancelled {
        cancellation: &'a Arc<Schedule>,
        cancels: Option<&'a Arc<Schedule>>,
    },
    NotRunning,
}

/// All versions of one planned train, plus its associations.
///
/// Versions are ordered by priority (highest first) then by calendar, so
/// resolution is a scan for the first version whose calendar runs.
#[derive(Debug, Clone)]
pub struct Service {
    uid: TimetableUid,
    versions: BTreeMap<VersionKey, Arc<Schedule>>,
    associations: BTreeMap<TimetableUid, AssociationSet>,
}

impl Service {
    pub fn new(uid: TimetableUid) -> Self {
        Self {
            uid,
            versions: BTreeMap::new(),
            associations: BTreeMap::new(),
        }
    }

    pub fn uid(&self) -> TimetableUid {
        self.uid
    }

    /// Add a version. A version with the same priority and calendar as an
    /// existing one is rejected and reported as a duplicate.
    pub fn add(&mut self, schedule: Arc<Schedule>) -> AddOutcome {
        let key = (Reverse(schedule.stp()), schedule.calendar().clone());
        match self.versions.entry(key) {
            Entry::Occupied(_) => AddOutcome::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(schedule);
                AddOutcome::Added
            }
        }
    }

    /// Versions in priority order.
    pub fn versions(&self) -> impl Iterator<Item = &Arc<Schedule>> {
        self.versions.values()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Does any version call at `location`?
    pub fn calls_at(&self, location: &Tiploc) -> bool {
        self.versions.values().any(|s| s.calls_at(location))
    }

    /// Pick the version that applies on `date`.
    pub fn resolve(&self, date: NaiveDate, holidays: &BankHolidays) -> Resolution<'_> {
        let mut running = self
            .versions
            .values()
            .filter(|s| s.calendar().runs_on(date, holidays));

        let Some(winner) = running.next() else {
            return Resolution::NotRunning;
        };

        if winner.stp().is_cancelled() {
            let cancels = running.find(|s| !s.stp().is_cancelled());
            Resolution::Cancelled {
                cancellation: winner,
                cancels,
            }
        } else {
            Resolution::Runs(winner)
        }
    }

    pub(crate) fn add_association(&mut self, association: Arc<Association>) -> AddOutcome {
        let partner = association.partner_of(&self.uid).uid;
        self.associations
            .entry(partner)
            .or_default()
            .add(association)
    }

    /// Association versions grouped by partner UID.
    pub fn associations(&self) -> impl Iterator<Item = (&TimetableUid, &AssociationSet)> {
        self.associations.iter()
    }

    pub fn has_associations(&self) -> bool {
        !self.associations.is_empty()
    }
}
