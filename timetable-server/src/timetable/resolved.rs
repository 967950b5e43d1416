//! Per-query materialisation of "schedule X on date Y".
//!
//! Resolved values are cheap to build, owned by the caller and thrown away
//! after the response. They hold `Arc`s into the immutable index.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

use crate::domain::{ResolveError, ScheduleTime, Tiploc, TimetableUid, Toc};

use super::association::{Association, AssociationCategory};
use super::schedule::{LocationKind, Schedule, ScheduleLocation};

/// One service on one concrete date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    schedule: Arc<Schedule>,
    on: NaiveDate,
    is_cancelled: bool,
    cancels: Option<Arc<Schedule>>,
    associations: Vec<ResolvedAssociation>,
}

impl ResolvedService {
    pub fn running(schedule: Arc<Schedule>, on: NaiveDate) -> Self {
        Self {
            schedule,
            on,
            is_cancelled: false,
            cancels: None,
            associations: Vec::new(),
        }
    }

    /// A cancellation winning on `on`. `cancels` is the version that would
    /// otherwise have run.
    pub fn cancelled(cancellation: Arc<Schedule>, cancels: Option<Arc<Schedule>>, on: NaiveDate) -> Self {
        Self {
            schedule: cancellation,
            on,
            is_cancelled: true,
            cancels,
            associations: Vec::new(),
        }
    }

    pub(crate) fn with_associations(mut self, associations: Vec<ResolvedAssociation>) -> Self {
        self.associations = associations;
        self
    }

    pub fn uid(&self) -> TimetableUid {
        self.schedule.uid()
    }

    /// The winning version (the cancellation record when cancelled).
    pub fn schedule(&self) -> &Arc<Schedule> {
        &self.schedule
    }

    /// The version a cancellation suppresses.
    pub fn cancelled_schedule(&self) -> Option<&Arc<Schedule>> {
        self.cancels.as_ref()
    }

    pub fn on(&self) -> NaiveDate {
        self.on
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    pub fn associations(&self) -> &[ResolvedAssociation] {
        &self.associations
    }

    /// The operator, falling back to the cancelled version's.
    pub fn toc(&self) -> Option<Toc> {
        self.schedule
            .toc()
            .or_else(|| self.cancels.as_ref().and_then(|s| s.toc()))
    }

    /// Current stop list: empty when cancelled.
    pub fn stops(&self) -> &[ScheduleLocation] {
        if self.is_cancelled {
            &[]
        } else {
            self.schedule.locations()
        }
    }

    /// The planned stop list, including the stops of a cancelled version.
    pub fn timetabled_stops(&self) -> &[ScheduleLocation] {
        match &self.cancels {
            Some(cancelled) if self.is_cancelled => cancelled.locations(),
            _ => self.schedule.locations(),
        }
    }

    /// Concrete departure from the origin.
    pub fn origin_departure(&self) -> Option<NaiveDateTime> {
        self.timetabled_stops()
            .first()
            .and_then(|s| s.public_departure.or(s.working_departure))
            .and_then(|t| t.on(self.on))
    }

    fn endpoint(&self, index: usize) -> Option<Endpoint> {
        let stop = self.timetabled_stops().get(index)?;
        Some(Endpoint {
            uid: self.uid(),
            location: stop.location,
            time: match stop.kind {
                LocationKind::Origin => concrete(stop.public_departure, self.on),
                _ => concrete(stop.public_arrival, self.on),
            },
        })
    }
}

fn concrete(time: Option<ScheduleTime>, on: NaiveDate) -> Option<NaiveDateTime> {
    time.and_then(|t| t.on(on))
}

/// An association applied to a resolved service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssociation {
    association: Arc<Association>,
    on: NaiveDate,
    is_main: bool,
    partner: Option<ResolvedService>,
    stop_index: Option<usize>,
    partner_stop_index: Option<usize>,
}

impl ResolvedAssociation {
    pub(crate) fn new(
        association: Arc<Association>,
        on: NaiveDate,
        is_main: bool,
        partner: Option<ResolvedService>,
        stop_index: Option<usize>,
        partner_stop_index: Option<usize>,
    ) -> Self {
        Self {
            association,
            on,
            is_main,
            partner,
            stop_index,
            partner_stop_index,
        }
    }

    pub fn association(&self) -> &Arc<Association> {
        &self.association
    }

    /// The main train's date for this association.
    pub fn on(&self) -> NaiveDate {
        self.on
    }

    pub fn category(&self) -> AssociationCategory {
        self.association.category
    }

    pub fn is_cancelled(&self) -> bool {
        self.association.stp.is_cancelled()
    }

    /// Whether the resolving service is the main side.
    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn partner_uid(&self) -> TimetableUid {
        if self.is_main {
            self.association.associated.uid
        } else {
            self.association.main.uid
        }
    }

    /// The partner as resolved on its own date; `None` if it does not run.
    pub fn partner(&self) -> Option<&ResolvedService> {
        self.partner.as_ref()
    }

    pub fn location(&self) -> Tiploc {
        self.association.location
    }

    /// Index of the shared location in the resolving service's stop list.
    pub fn stop_index(&self) -> Option<usize> {
        self.stop_index
    }

    /// Index of the shared location in the partner's stop list.
    pub fn partner_stop_index(&self) -> Option<usize> {
        self.partner_stop_index
    }

    /// The shared location is missing from one side's current stop list.
    pub fn is_broken(&self) -> bool {
        self.stop_index.is_none() || self.partner_stop_index.is_none()
    }

    /// Usable for through-journeys: not cancelled, not broken, partner runs.
    fn is_live(&self) -> bool {
        !self.is_cancelled()
            && !self.is_broken()
            && self.partner.as_ref().is_some_and(|p| !p.is_cancelled())
    }

    /// How this association affects a stop at `index` on the resolving
    /// service.
    fn relation_to(&self, index: usize) -> Option<Relation> {
        if !self.is_live() {
            return None;
        }
        let at = self.stop_index?;
        match (self.category(), self.is_main) {
            // Main splits: the earlier stops also reach the associated portion
            (AssociationCategory::Split, true) if index < at => Some(Relation::ContinuesWith),
            // Associated joins: the earlier stops carry on in the main train
            (AssociationCategory::Join, false) if index < at => Some(Relation::ContinuesAs),
            // Main after a join: the associated portion came from elsewhere
            (AssociationCategory::Join, true) if index > at => Some(Relation::JoinedBy),
            // Associated after a split: it started as the main train
            (AssociationCategory::Split, false) if index > at => Some(Relation::FormedFrom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    ContinuesWith,
    ContinuesAs,
    JoinedBy,
    FormedFrom,
}

/// The start or end of a train's journey as seen from one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub uid: TimetableUid,
    pub location: Tiploc,
    pub time: Option<NaiveDateTime>,
}

/// One call of a resolved service, with concrete day-shifted times.
#[derive(Debug, Clone)]
pub struct ResolvedServiceStop {
    service: Arc<ResolvedService>,
    index: usize,
    arrival: Option<NaiveDateTime>,
    departure: Option<NaiveDateTime>,
}

impl ResolvedServiceStop {
    /// Materialise the stop at `index` of the service's timetabled stops.
    pub fn new(service: Arc<ResolvedService>, index: usize) -> Result<Self, ResolveError> {
        let stop = service
            .timetabled_stops()
            .get(index)
            .ok_or(ResolveError::NoSuchStop {
                uid: service.uid(),
                index,
            })?;

        if stop.first_time().is_none() {
            return Err(ResolveError::MissingTime {
                uid: service.uid(),
                location: stop.location,
            });
        }

        let on = service.on();
        let arrival = resolve_time(stop.public_arrival, on)?;
        let departure = resolve_time(stop.public_departure, on)?;

        Ok(Self {
            service,
            index,
            arrival,
            departure,
        })
    }

    pub fn service(&self) -> &Arc<ResolvedService> {
        &self.service
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn location(&self) -> &ScheduleLocation {
        // index validated in `new`
        &self.service.timetabled_stops()[self.index]
    }

    pub fn arrival(&self) -> Option<NaiveDateTime> {
        self.arrival
    }

    pub fn departure(&self) -> Option<NaiveDateTime> {
        self.departure
    }

    pub fn is_cancelled(&self) -> bool {
        self.service.is_cancelled()
    }

    fn relations(&self) -> impl Iterator<Item = (Relation, &ResolvedAssociation)> {
        self.service
            .associations()
            .iter()
            .filter_map(|a| a.relation_to(self.index).map(|r| (r, a)))
    }

    /// Where passengers at this stop can end up.
    ///
    /// Normally the service's own destination. A train that joins another
    /// is redirected to the main train's destination; a train that later
    /// splits also reaches the associated portion's destination.
    pub fn effective_destinations(&self) -> Vec<Endpoint> {
        let last = self.service.timetabled_stops().len().saturating_sub(1);
        let mut redirected = Vec::new();
        let mut extra = Vec::new();

        for (relation, association) in self.relations() {
            let Some(partner) = association.partner() else {
                continue;
            };
            let partner_last = partner.timetabled_stops().len().saturating_sub(1);
            match relation {
                Relation::ContinuesAs => redirected.extend(partner.endpoint(partner_last)),
                Relation::ContinuesWith => extra.extend(partner.endpoint(partner_last)),
                Relation::JoinedBy | Relation::FormedFrom => {}
            }
        }

        if redirected.is_empty() {
            redirected.extend(self.service.endpoint(last));
        }
        redirected.extend(extra);
        redirected
    }

    /// Where the train calling here started.
    ///
    /// Normally the service's own origin. A portion formed by a split is
    /// redirected to the main train's origin; a train joined by another
    /// also has the joining portion's origin.
    pub fn effective_origins(&self) -> Vec<Endpoint> {
        let mut redirected = Vec::new();
        let mut extra = Vec::new();

        for (relation, association) in self.relations() {
            let Some(partner) = association.partner() else {
                continue;
            };
            match relation {
                Relation::FormedFrom => redirected.extend(partner.endpoint(0)),
                Relation::JoinedBy => extra.extend(partner.endpoint(0)),
                Relation::ContinuesAs | Relation::ContinuesWith => {}
            }
        }

        if redirected.is_empty() {
            redirected.extend(self.service.endpoint(0));
        }
        redirected.extend(extra);
        redirected
    }

    /// Does the train go on from here to any of `locations`, directly or
    /// through a join or split?
    pub fn continues_to(&self, locations: &[Tiploc]) -> bool {
        let later = &self.service.timetabled_stops()[self.index + 1..];
        if calls_at_any(later, locations, |s| s.public_arrival.is_some()) {
            return true;
        }

        self.relations().any(|(relation, association)| {
            matches!(relation, Relation::ContinuesAs | Relation::ContinuesWith)
                && partner_slice(association, Side::After)
                    .is_some_and(|stops| calls_at_any(stops, locations, |s| s.public_arrival.is_some()))
        })
    }

    /// Did the train come to this stop from any of `locations`, directly or
    /// through a join or split?
    pub fn came_from(&self, locations: &[Tiploc]) -> bool {
        let earlier = &self.service.timetabled_stops()[..self.index];
        if calls_at_any(earlier, locations, |s| s.public_departure.is_some()) {
            return true;
        }

        self.relations().any(|(relation, association)| {
            matches!(relation, Relation::JoinedBy | Relation::FormedFrom)
                && partner_slice(association, Side::Before)
                    .is_some_and(|stops| calls_at_any(stops, locations, |s| s.public_departure.is_some()))
        })
    }
}

#[derive(Clone, Copy)]
enum Side {
    Before,
    After,
}

fn partner_slice(association: &ResolvedAssociation, side: Side) -> Option<&[ScheduleLocation]> {
    let partner = association.partner()?;
    let at = association.partner_stop_index()?;
    let stops = partner.stops();
    match side {
        Side::Before => stops.get(..at),
        Side::After => stops.get(at + 1..),
    }
}

fn calls_at_any(
    stops: &[ScheduleLocation],
    locations: &[Tiploc],
    has_time: impl Fn(&ScheduleLocation) -> bool,
) -> bool {
    stops
        .iter()
        .any(|s| s.is_advertised_stop() && has_time(s) && locations.contains(&s.location))
}

fn resolve_time(
    time: Option<ScheduleTime>,
    on: NaiveDate,
) -> Result<Option<NaiveDateTime>, ResolveError> {
    match time {
        None => Ok(None),
        Some(t) => t.on(on).map(Some).ok_or(ResolveError::DateOutOfRange {
            date: on,
            days: i64::from(t.day_offset()),
        }),
    }
}
