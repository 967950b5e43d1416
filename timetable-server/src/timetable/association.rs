//! Associations: declared links between two schedules at a shared location.
//!
//! An association is versioned like a schedule (STP indicator + calendar)
//! and its calendar is expressed in the main train's dates. The associated
//! train may run on the day before or after, given by the date indicator.

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{BankHolidays, Calendar, StpIndicator, Tiploc, TimetableUid};

/// Error returned when parsing an unknown association code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid association {field}: {value:?}")]
pub struct InvalidAssociationCode {
    field: &'static str,
    value: String,
}

/// What kind of link an association declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum AssociationCategory {
    /// The associated train joins the main train.
    Join,
    /// The main train divides, the associated train continues from the split.
    Split,
    /// The associated train is the next working of the main train's unit.
    NextPrevious,
    Linked,
    #[default]
    None,
}

impl AssociationCategory {
    /// Parse the feed code: `JJ`, `VV`, `NP`, `LK` or blank.
    pub fn parse(s: &str) -> Result<Self, InvalidAssociationCode> {
        match s.trim() {
            "JJ" => Ok(Self::Join),
            "VV" => Ok(Self::Split),
            "NP" => Ok(Self::NextPrevious),
            "LK" => Ok(Self::Linked),
            "" => Ok(Self::None),
            other => Err(InvalidAssociationCode {
                field: "category",
                value: other.to_string(),
            }),
        }
    }

    /// The feed code this category was parsed from.
    pub fn code(self) -> &'static str {
        match self {
            Self::Join => "JJ",
            Self::Split => "VV",
            Self::NextPrevious => "NP",
            Self::Linked => "LK",
            Self::None => "",
        }
    }
}

impl TryFrom<String> for AssociationCategory {
    type Error = InvalidAssociationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Which day the associated train runs on, relative to the main train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DateIndicator {
    Standard,
    NextDay,
    PreviousDay,
    #[default]
    None,
}

impl DateIndicator {
    /// Parse the feed code: `S`, `N`, `P` or blank.
    pub fn parse(s: &str) -> Result<Self, InvalidAssociationCode> {
        match s.trim() {
            "S" => Ok(Self::Standard),
            "N" => Ok(Self::NextDay),
            "P" => Ok(Self::PreviousDay),
            "" => Ok(Self::None),
            other => Err(InvalidAssociationCode {
                field: "date indicator",
                value: other.to_string(),
            }),
        }
    }

    /// Days to add to the main train's date to get the associated train's.
    pub fn day_shift(self) -> i64 {
        match self {
            Self::NextDay => 1,
            Self::PreviousDay => -1,
            Self::Standard | Self::None => 0,
        }
    }
}

impl TryFrom<String> for DateIndicator {
    type Error = InvalidAssociationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// One side of an association: which train, and which of its calls at
/// the shared location (1-based, for trains calling there more than once).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssociationEnd {
    pub uid: TimetableUid,
    pub sequence: Option<u8>,
}

impl AssociationEnd {
    pub fn new(uid: TimetableUid) -> Self {
        Self {
            uid,
            sequence: None,
        }
    }

    pub fn occurrence(&self) -> u8 {
        self.sequence.unwrap_or(1)
    }
}

/// A declared relationship between two schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub main: AssociationEnd,
    pub associated: AssociationEnd,
    pub location: Tiploc,
    pub calendar: Arc<Calendar>,
    pub stp: StpIndicator,
    pub category: AssociationCategory,
    pub date_indicator: DateIndicator,
    pub is_passenger: bool,
}

impl Association {
    /// Whether `uid` is the main side.
    pub fn is_main(&self, uid: &TimetableUid) -> bool {
        &self.main.uid == uid
    }

    /// The end belonging to `uid`.
    pub fn end_of(&self, uid: &TimetableUid) -> &AssociationEnd {
        if self.is_main(uid) {
            &self.main
        } else {
            &self.associated
        }
    }

    /// The opposite end from `uid`.
    pub fn partner_of(&self, uid: &TimetableUid) -> &AssociationEnd {
        if self.is_main(uid) {
            &self.associated
        } else {
            &self.main
        }
    }

    /// Only passenger associations and cancellations are kept in the index;
    /// a cancellation has to be present to suppress the version it cancels.
    pub fn should_attach(&self) -> bool {
        self.is_passenger || self.stp.is_cancelled()
    }

    /// The associated train's date for a main train running on `main_date`.
    pub fn associated_date(&self, main_date: NaiveDate) -> Option<NaiveDate> {
        shift_date(main_date, self.date_indicator.day_shift())
    }

    /// The main train's date when `uid` runs on `date`.
    pub fn main_date_for(&self, uid: &TimetableUid, date: NaiveDate) -> Option<NaiveDate> {
        if self.is_main(uid) {
            Some(date)
        } else {
            shift_date(date, -self.date_indicator.day_shift())
        }
    }

    /// The partner's date when `uid` runs on `date`.
    pub fn partner_date_for(&self, uid: &TimetableUid, date: NaiveDate) -> Option<NaiveDate> {
        if self.is_main(uid) {
            self.associated_date(date)
        } else {
            self.main_date_for(uid, date)
        }
    }
}

/// Move `date` by a signed number of days.
pub fn shift_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

type AssociationKey = (Tiploc, Reverse<StpIndicator>, Arc<Calendar>);

/// Outcome of adding a version to an STP-ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Same priority and calendar as an existing version; the existing one
    /// was kept.
    Duplicate,
}

/// All association versions between one service and one partner.
///
/// Keyed by shared location, then priority (highest first), then calendar.
#[derive(Debug, Clone, Default)]
pub struct AssociationSet {
    versions: BTreeMap<AssociationKey, Arc<Association>>,
}

impl AssociationSet {
    pub fn add(&mut self, association: Arc<Association>) -> AddOutcome {
        let key = (
            association.location,
            Reverse(association.stp),
            association.calendar.clone(),
        );
        match self.versions.entry(key) {
            std::collections::btree_map::Entry::Occupied(_) => AddOutcome::Duplicate,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(association);
                AddOutcome::Added
            }
        }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Association>> {
        self.versions.values()
    }

    /// The winning version at each shared location for `uid` running on
    /// `date`, paired with the main train's date.
    pub fn applicable(
        &self,
        uid: &TimetableUid,
        date: NaiveDate,
        holidays: &BankHolidays,
    ) -> Vec<(Arc<Association>, NaiveDate)> {
        let mut winners: Vec<(Arc<Association>, NaiveDate)> = Vec::new();

        for ((location, _, _), association) in &self.versions {
            if winners.last().is_some_and(|(w, _)| &w.location == location) {
                continue;
            }

            let Some(main_date) = association.main_date_for(uid, date) else {
                continue;
            };

            if association.calendar.runs_on(main_date, holidays) {
                winners.push((association.clone(), main_date));
            }
        }

        winners
    }
}
