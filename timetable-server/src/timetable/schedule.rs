//! Schedule versions and their stop lists.

use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{
    Activities, Activity, Calendar, RetailServiceId, ScheduleError, ScheduleTime, StpIndicator,
    Tiploc, TimetableUid, Toc, assign_day_offsets,
};

/// The role a location plays in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Origin,
    Intermediate,
    Pass,
    Destination,
}

impl LocationKind {
    fn label(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Intermediate => "intermediate stop",
            Self::Pass => "pass",
            Self::Destination => "destination",
        }
    }
}

/// One location in a schedule's stop list.
///
/// Public times are what passengers see; working times are what the train
/// is planned to do. A pass only has a working pass time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleLocation {
    pub kind: LocationKind,
    pub location: Tiploc,
    pub sequence: u16,
    pub public_arrival: Option<ScheduleTime>,
    pub public_departure: Option<ScheduleTime>,
    pub working_arrival: Option<ScheduleTime>,
    pub working_departure: Option<ScheduleTime>,
    pub working_pass: Option<ScheduleTime>,
    pub platform: Option<String>,
    pub activities: Activities,
}

impl ScheduleLocation {
    fn empty(kind: LocationKind, location: Tiploc, sequence: u16) -> Self {
        Self {
            kind,
            location,
            sequence,
            public_arrival: None,
            public_departure: None,
            working_arrival: None,
            working_departure: None,
            working_pass: None,
            platform: None,
            activities: Activities::default(),
        }
    }

    /// An origin departing at `departure` (public and working).
    pub fn origin(location: Tiploc, sequence: u16, departure: ScheduleTime) -> Self {
        Self {
            public_departure: Some(departure),
            working_departure: Some(departure),
            activities: [Activity::TrainBegins].into_iter().collect(),
            ..Self::empty(LocationKind::Origin, location, sequence)
        }
    }

    /// A calling point with public and working times equal.
    pub fn stop(
        location: Tiploc,
        sequence: u16,
        arrival: ScheduleTime,
        departure: ScheduleTime,
    ) -> Self {
        Self {
            public_arrival: Some(arrival),
            public_departure: Some(departure),
            working_arrival: Some(arrival),
            working_departure: Some(departure),
            activities: [Activity::StopsToTakeUpAndSetDown].into_iter().collect(),
            ..Self::empty(LocationKind::Intermediate, location, sequence)
        }
    }

    pub fn pass(location: Tiploc, sequence: u16, pass: ScheduleTime) -> Self {
        Self {
            working_pass: Some(pass),
            ..Self::empty(LocationKind::Pass, location, sequence)
        }
    }

    pub fn destination(location: Tiploc, sequence: u16, arrival: ScheduleTime) -> Self {
        Self {
            public_arrival: Some(arrival),
            working_arrival: Some(arrival),
            activities: [Activity::TrainFinishes].into_iter().collect(),
            ..Self::empty(LocationKind::Destination, location, sequence)
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_activities(mut self, activities: Activities) -> Self {
        self.activities = activities;
        self
    }

    /// A stop shown to the public: not a pass, has a public time, and has
    /// either no activity codes or a passenger activity.
    pub fn is_advertised_stop(&self) -> bool {
        self.kind != LocationKind::Pass
            && (self.public_arrival.is_some() || self.public_departure.is_some())
            && (self.activities.is_empty() || self.activities.has_passenger_activity())
    }

    /// Any time at all for this location, earliest first.
    pub fn first_time(&self) -> Option<ScheduleTime> {
        self.public_arrival
            .or(self.working_arrival)
            .or(self.working_pass)
            .or(self.public_departure)
            .or(self.working_departure)
    }

    /// The time slots in chronological order, used for day offset assignment.
    fn times_mut(&mut self) -> [&mut Option<ScheduleTime>; 5] {
        [
            &mut self.working_arrival,
            &mut self.public_arrival,
            &mut self.working_pass,
            &mut self.public_departure,
            &mut self.working_departure,
        ]
    }
}

/// Descriptive fields of a schedule version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDetails {
    pub toc: Option<Toc>,
    pub retail_service_id: Option<RetailServiceId>,
    /// Signalling headcode, e.g. "2K45".
    pub train_identity: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub seat_class: Option<String>,
    pub sleepers: Option<String>,
    pub reservations: Option<String>,
    pub catering: Option<String>,
}

/// One STP version of a planned train over one calendar.
///
/// Immutable once built. Times in the stop list carry day offsets from the
/// schedule's start day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    uid: TimetableUid,
    stp: StpIndicator,
    calendar: Arc<Calendar>,
    details: ScheduleDetails,
    locations: Vec<ScheduleLocation>,
}

impl Schedule {
    /// Validate and build a schedule version.
    ///
    /// Locations must be in ascending sequence order. A running version
    /// must have exactly one origin (first) and one destination (last); a
    /// cancellation may have no locations. Bare times of day are given day
    /// offsets by walking the stop list.
    pub fn new(
        uid: TimetableUid,
        stp: StpIndicator,
        calendar: Arc<Calendar>,
        details: ScheduleDetails,
        mut locations: Vec<ScheduleLocation>,
    ) -> Result<Self, ScheduleError> {
        if locations.windows(2).any(|w| w[0].sequence >= w[1].sequence) {
            return Err(ScheduleError::OutOfSequence(uid));
        }

        if !stp.is_cancelled() || !locations.is_empty() {
            validate_terminals(uid, &locations)?;
        }

        assign_day_offsets(locations.iter_mut().flat_map(ScheduleLocation::times_mut));

        Ok(Self {
            uid,
            stp,
            calendar,
            details,
            locations,
        })
    }

    pub fn uid(&self) -> TimetableUid {
        self.uid
    }

    pub fn stp(&self) -> StpIndicator {
        self.stp
    }

    pub fn calendar(&self) -> &Arc<Calendar> {
        &self.calendar
    }

    pub fn details(&self) -> &ScheduleDetails {
        &self.details
    }

    pub fn toc(&self) -> Option<Toc> {
        self.details.toc
    }

    pub fn retail_service_id(&self) -> Option<&RetailServiceId> {
        self.details.retail_service_id.as_ref()
    }

    pub fn locations(&self) -> &[ScheduleLocation] {
        &self.locations
    }

    pub fn origin(&self) -> Option<&ScheduleLocation> {
        self.locations.first()
    }

    pub fn destination(&self) -> Option<&ScheduleLocation> {
        self.locations.last()
    }

    /// Does any location in the stop list match `location`?
    pub fn calls_at(&self, location: &Tiploc) -> bool {
        self.locations.iter().any(|l| &l.location == location)
    }
}

fn validate_terminals(uid: TimetableUid, locations: &[ScheduleLocation]) -> Result<(), ScheduleError> {
    let last = locations.len().saturating_sub(1);

    match locations.first() {
        Some(first) if first.kind == LocationKind::Origin => {}
        _ => return Err(ScheduleError::MissingOrigin(uid)),
    }

    match locations.last() {
        Some(l) if l.kind == LocationKind::Destination && last > 0 => {}
        _ => return Err(ScheduleError::MissingDestination(uid)),
    }

    for (i, l) in locations.iter().enumerate() {
        let misplaced = match l.kind {
            LocationKind::Origin => i != 0,
            LocationKind::Destination => i != last,
            LocationKind::Intermediate | LocationKind::Pass => false,
        };
        if misplaced {
            return Err(ScheduleError::MisplacedTerminal {
                uid,
                kind: l.kind.label(),
                location: l.location,
            });
        }
    }

    Ok(())
}

/// Find the stop list index of the `occurrence`-th (1-based) call at
/// `location`.
pub fn nth_index_at(
    stops: &[ScheduleLocation],
    location: &Tiploc,
    occurrence: u8,
) -> Option<usize> {
    stops
        .iter()
        .enumerate()
        .filter(|(_, s)| &s.location == location)
        .nth(usize::from(occurrence.max(1)) - 1)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BankHolidayPolicy, DayMask};
    use chrono::NaiveDate;

    fn t(s: &str) -> ScheduleTime {
        ScheduleTime::parse(s).unwrap()
    }

    fn tl(s: &str) -> Tiploc {
        Tiploc::parse(s).unwrap()
    }

    fn uid() -> TimetableUid {
        TimetableUid::parse("X12345").unwrap()
    }

    fn calendar() -> Arc<Calendar> {
        Arc::new(
            Calendar::new(
                NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 8, 31).unwrap(),
                DayMask::WEEKDAYS,
                BankHolidayPolicy::RunsOnBankHoliday,
            )
            .unwrap(),
        )
    }

    fn build(stp: StpIndicator, locations: Vec<ScheduleLocation>) -> Result<Schedule, ScheduleError> {
        Schedule::new(uid(), stp, calendar(), ScheduleDetails::default(), locations)
    }

    #[test]
    fn valid_schedule() {
        let schedule = build(
            StpIndicator::Permanent,
            vec![
                ScheduleLocation::origin(tl("WATRLMN"), 1, t("10:00")),
                ScheduleLocation::pass(tl("VAUXHLM"), 2, t("10:03")),
                ScheduleLocation::stop(tl("CLPHMJN"), 3, t("10:07"), t("10:08")),
                ScheduleLocation::destination(tl("SURBITN"), 4, t("10:20")),
            ],
        )
        .unwrap();

        assert_eq!(schedule.locations().len(), 4);
        assert_eq!(schedule.origin().unwrap().location, tl("WATRLMN"));
        assert_eq!(schedule.destination().unwrap().location, tl("SURBITN"));
        assert!(schedule.calls_at(&tl("VAUXHLM")));
        assert!(!schedule.calls_at(&tl("WOKING")));
    }

    #[test]
    fn cancelled_version_may_be_empty() {
        assert!(build(StpIndicator::Cancelled, vec![]).is_ok());
        assert_eq!(
            build(StpIndicator::Permanent, vec![]).unwrap_err(),
            ScheduleError::MissingOrigin(uid())
        );
    }

    #[test]
    fn rejects_out_of_sequence() {
        let err = build(
            StpIndicator::Permanent,
            vec![
                ScheduleLocation::origin(tl("WATRLMN"), 2, t("10:00")),
                ScheduleLocation::destination(tl("SURBITN"), 1, t("10:20")),
            ],
        )
        .unwrap_err();
        assert_eq!(err, ScheduleError::OutOfSequence(uid()));
    }

    #[test]
    fn rejects_missing_destination() {
        let err = build(
            StpIndicator::Permanent,
            vec![
                ScheduleLocation::origin(tl("WATRLMN"), 1, t("10:00")),
                ScheduleLocation::stop(tl("CLPHMJN"), 2, t("10:07"), t("10:08")),
            ],
        )
        .unwrap_err();
        assert_eq!(err, ScheduleError::MissingDestination(uid()));
    }

    #[test]
    fn rejects_second_origin() {
        let err = build(
            StpIndicator::Overlay,
            vec![
                ScheduleLocation::origin(tl("WATRLMN"), 1, t("10:00")),
                ScheduleLocation::origin(tl("CLPHMJN"), 2, t("10:07")),
                ScheduleLocation::destination(tl("SURBITN"), 3, t("10:20")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::MisplacedTerminal { kind: "origin", .. }));
    }

    #[test]
    fn assigns_day_offsets_across_midnight() {
        let schedule = build(
            StpIndicator::Permanent,
            vec![
                ScheduleLocation::origin(tl("WATRLMN"), 1, t("23:40")),
                ScheduleLocation::pass(tl("CLPHMJN"), 2, t("23:52")),
                ScheduleLocation::stop(tl("SURBITN"), 3, t("23:59"), t("00:01")),
                ScheduleLocation::destination(tl("WOKING"), 4, t("00:25")),
            ],
        )
        .unwrap();

        let stops = schedule.locations();
        assert_eq!(stops[0].public_departure.unwrap().day_offset(), 0);
        assert_eq!(stops[1].working_pass.unwrap().day_offset(), 0);
        assert_eq!(stops[2].public_arrival.unwrap().day_offset(), 0);
        assert_eq!(stops[2].public_departure.unwrap().day_offset(), 1);
        assert_eq!(stops[3].public_arrival.unwrap().day_offset(), 1);
    }

    #[test]
    fn advertised_stop_rules() {
        assert!(ScheduleLocation::origin(tl("WATRLMN"), 1, t("10:00")).is_advertised_stop());
        assert!(!ScheduleLocation::pass(tl("VAUXHLM"), 2, t("10:03")).is_advertised_stop());

        let operational = ScheduleLocation::stop(tl("CLPHMJN"), 3, t("10:07"), t("10:08"))
            .with_activities(Activities::parse("OP"));
        assert!(!operational.is_advertised_stop());

        let no_codes = ScheduleLocation::stop(tl("CLPHMJN"), 3, t("10:07"), t("10:08"))
            .with_activities(Activities::default());
        assert!(no_codes.is_advertised_stop());
    }

    #[test]
    fn nth_occurrence_lookup() {
        let stops = vec![
            ScheduleLocation::origin(tl("WATRLMN"), 1, t("10:00")),
            ScheduleLocation::stop(tl("CLPHMJN"), 2, t("10:07"), t("10:08")),
            ScheduleLocation::stop(tl("WIMBLDN"), 3, t("10:12"), t("10:13")),
            ScheduleLocation::destination(tl("CLPHMJN"), 4, t("10:30")),
        ];
        assert_eq!(nth_index_at(&stops, &tl("CLPHMJN"), 1), Some(1));
        assert_eq!(nth_index_at(&stops, &tl("CLPHMJN"), 0), Some(1));
        assert_eq!(nth_index_at(&stops, &tl("CLPHMJN"), 2), Some(3));
        assert_eq!(nth_index_at(&stops, &tl("CLPHMJN"), 3), None);
        assert_eq!(nth_index_at(&stops, &tl("SURBITN"), 1), None);
    }
}
