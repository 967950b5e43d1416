//! The central timetable index.
//!
//! Built once by a single writer during load, then shared read-only. Every
//! query takes `&self` and allocates its own resolved values.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{BankHolidays, RetailServiceId, Tiploc, TimetableUid, Toc};

use super::association::{AddOutcome, Association, shift_date};
use super::resolved::{ResolvedAssociation, ResolvedService};
use super::schedule::{Schedule, nth_index_at};
use super::service::{Resolution, Service};

/// Counts from attaching a batch of associations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachCounts {
    pub attached: usize,
    /// Naming a service the timetable does not hold
    pub dropped: usize,
    /// Same version already attached
    pub duplicates: usize,
}

/// Outcome of a service lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Success,
    ServiceNotFound,
    NoScheduleOnDate,
}

/// Every service, indexed by timetable UID, retail service group, operator
/// and calling location.
#[derive(Debug, Default)]
pub struct TimetableData {
    services: HashMap<TimetableUid, Service>,
    by_retail_service: HashMap<String, BTreeSet<TimetableUid>>,
    by_toc: HashMap<Toc, BTreeSet<TimetableUid>>,
    by_location: HashMap<Tiploc, BTreeSet<TimetableUid>>,
    bank_holidays: BankHolidays,
}

impl TimetableData {
    pub fn new(bank_holidays: BankHolidays) -> Self {
        Self {
            bank_holidays,
            ..Self::default()
        }
    }

    pub fn bank_holidays(&self) -> &BankHolidays {
        &self.bank_holidays
    }

    /// Number of distinct timetable UIDs.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service(&self, uid: &TimetableUid) -> Option<&Service> {
        self.services.get(uid)
    }

    /// UIDs of services with any version touching `location`.
    pub fn services_at(&self, location: &Tiploc) -> impl Iterator<Item = TimetableUid> + '_ {
        self.by_location
            .get(location)
            .into_iter()
            .flat_map(|uids| uids.iter().copied())
    }

    /// Add one schedule version. Secondary indices are updated for every
    /// version, cancellations included.
    pub fn add_schedule(&mut self, schedule: Schedule) -> AddOutcome {
        let uid = schedule.uid();
        let schedule = Arc::new(schedule);

        let outcome = self
            .services
            .entry(uid)
            .or_insert_with(|| Service::new(uid))
            .add(schedule.clone());

        if outcome == AddOutcome::Duplicate {
            warn!(
                uid = %uid,
                stp = %schedule.stp(),
                calendar = ?schedule.calendar(),
                "duplicate schedule version ignored"
            );
            return outcome;
        }

        if let Some(retail) = schedule.retail_service_id() {
            self.by_retail_service
                .entry(retail.service_group().to_string())
                .or_default()
                .insert(uid);
        }
        if let Some(toc) = schedule.toc() {
            self.by_toc.entry(toc).or_default().insert(uid);
        }
        for location in schedule.locations() {
            self.by_location.entry(location.location).or_default().insert(uid);
        }

        outcome
    }

    /// Attach associations to both services they link. Returns the number
    /// attached; associations naming an unknown service are dropped.
    pub fn add_associations(
        &mut self,
        associations: impl IntoIterator<Item = Association>,
    ) -> AttachCounts {
        let mut counts = AttachCounts::default();

        for association in associations {
            if !association.should_attach() {
                continue;
            }

            let main = association.main.uid;
            let associated = association.associated.uid;
            if !self.services.contains_key(&main) || !self.services.contains_key(&associated) {
                debug!(main = %main, associated = %associated, "association names an unknown service");
                counts.dropped += 1;
                continue;
            }

            let association = Arc::new(association);
            let mut duplicate = false;
            for uid in [main, associated] {
                if let Some(service) = self.services.get_mut(&uid) {
                    duplicate |= service.add_association(association.clone()) == AddOutcome::Duplicate;
                }
            }

            if duplicate {
                counts.duplicates += 1;
                warn!(
                    main = %main,
                    associated = %associated,
                    location = %association.location,
                    "duplicate association version ignored"
                );
            } else {
                counts.attached += 1;
            }
        }

        if counts.dropped > 0 {
            warn!(dropped = counts.dropped, "dropped associations with unknown services");
        }
        counts
    }

    /// Resolve one service on `date`, associations included.
    pub fn get_schedule_by_timetable_uid(
        &self,
        uid: &TimetableUid,
        date: NaiveDate,
    ) -> (LookupStatus, Option<ResolvedService>) {
        let Some(service) = self.services.get(uid) else {
            return (LookupStatus::ServiceNotFound, None);
        };

        match self.resolve_service(service, date) {
            Some(resolved) => {
                let associations = self.resolve_associations(service, &resolved);
                (LookupStatus::Success, Some(resolved.with_associations(associations)))
            }
            None => (LookupStatus::NoScheduleOnDate, None),
        }
    }

    /// Resolve every portion sharing the retail service group of `id`.
    pub fn get_schedule_by_retail_service_id(
        &self,
        id: &RetailServiceId,
        date: NaiveDate,
    ) -> (LookupStatus, Vec<ResolvedService>) {
        let Some(uids) = self.by_retail_service.get(id.service_group()) else {
            return (LookupStatus::ServiceNotFound, Vec::new());
        };

        let resolved = uids
            .iter()
            .filter_map(|uid| self.get_schedule_by_timetable_uid(uid, date).1)
            .collect();
        finish_lookup(resolved)
    }

    /// Resolve every service run by `toc` on the operating day `date`.
    ///
    /// With a day boundary, the operating day runs from `boundary` on
    /// `date` to `boundary` on the next day, and services are attributed
    /// by their origin departure.
    pub fn get_schedules_by_toc(
        &self,
        toc: &Toc,
        date: NaiveDate,
        day_boundary: Option<NaiveTime>,
    ) -> (LookupStatus, Vec<ResolvedService>) {
        let Some(uids) = self.by_toc.get(toc) else {
            return (LookupStatus::ServiceNotFound, Vec::new());
        };

        let boundary = day_boundary.filter(|b| *b != NaiveTime::MIN);
        let mut resolved = Vec::new();

        for uid in uids {
            match boundary {
                None => resolved.extend(self.get_schedule_by_timetable_uid(uid, date).1),
                Some(boundary) => {
                    let start = date.and_time(boundary);
                    let candidates = [Some(date), shift_date(date, 1)];
                    for on in candidates.into_iter().flatten() {
                        let Some(service) = self.get_schedule_by_timetable_uid(uid, on).1 else {
                            continue;
                        };
                        let in_day = service.origin_departure().is_some_and(|departs| {
                            departs >= start && departs < start + chrono::Duration::days(1)
                        });
                        if in_day {
                            resolved.push(service);
                        }
                    }
                }
            }
        }

        finish_lookup(resolved)
    }

    /// STP resolution only, no associations.
    pub(crate) fn resolve_service(&self, service: &Service, date: NaiveDate) -> Option<ResolvedService> {
        match service.resolve(date, &self.bank_holidays) {
            Resolution::Runs(schedule) => Some(ResolvedService::running(schedule.clone(), date)),
            Resolution::Cancelled { cancellation, cancels } => Some(ResolvedService::cancelled(
                cancellation.clone(),
                cancels.cloned(),
                date,
            )),
            Resolution::NotRunning => None,
        }
    }

    pub(crate) fn resolve_associations(
        &self,
        service: &Service,
        resolved: &ResolvedService,
    ) -> Vec<ResolvedAssociation> {
        let uid = service.uid();
        let date = resolved.on();
        let mut out = Vec::new();

        for (partner_uid, set) in service.associations() {
            for (association, main_date) in set.applicable(&uid, date, &self.bank_holidays) {
                let is_main = association.is_main(&uid);

                let partner = association
                    .partner_date_for(&uid, date)
                    .and_then(|on| {
                        let partner = self.services.get(partner_uid)?;
                        self.resolve_service(partner, on)
                    });

                let stop_index = nth_index_at(
                    resolved.stops(),
                    &association.location,
                    association.end_of(&uid).occurrence(),
                );
                let partner_stop_index = partner.as_ref().and_then(|p| {
                    nth_index_at(
                        p.stops(),
                        &association.location,
                        association.partner_of(&uid).occurrence(),
                    )
                });

                out.push(ResolvedAssociation::new(
                    association,
                    main_date,
                    is_main,
                    partner,
                    stop_index,
                    partner_stop_index,
                ));
            }
        }

        out
    }
}

fn finish_lookup(mut resolved: Vec<ResolvedService>) -> (LookupStatus, Vec<ResolvedService>) {
    if resolved.is_empty() {
        return (LookupStatus::NoScheduleOnDate, resolved);
    }
    resolved.sort_by_key(|s| (s.origin_departure().unwrap_or(NaiveDateTime::MAX), s.uid()));
    (LookupStatus::Success, resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BankHolidayPolicy, Calendar, DayMask, ScheduleTime, StpIndicator};
    use crate::timetable::{AssociationCategory, AssociationEnd, DateIndicator, ScheduleDetails, ScheduleLocation};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tiploc(s: &str) -> Tiploc {
        Tiploc::parse(s).unwrap()
    }

    fn uid(s: &str) -> TimetableUid {
        TimetableUid::parse(s).unwrap()
    }

    fn every_day() -> Arc<Calendar> {
        Arc::new(
            Calendar::new(
                date(2019, 8, 1),
                date(2019, 8, 31),
                DayMask::EVERY_DAY,
                BankHolidayPolicy::RunsOnBankHoliday,
            )
            .unwrap(),
        )
    }

    fn schedule(id: &str, toc: &str, retail: &str, departs: &str, arrives: &str) -> Schedule {
        let t = |s: &str| ScheduleTime::parse(s).unwrap();
        let details = ScheduleDetails {
            toc: Some(Toc::parse(toc).unwrap()),
            retail_service_id: Some(RetailServiceId::parse(retail).unwrap()),
            ..ScheduleDetails::default()
        };
        Schedule::new(
            uid(id),
            StpIndicator::Permanent,
            every_day(),
            details,
            vec![
                ScheduleLocation::origin(tiploc("WATRLMN"), 1, t(departs)),
                ScheduleLocation::destination(tiploc("SURBITN"), 2, t(arrives)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn unknown_uid_is_not_found() {
        let data = TimetableData::default();
        let (status, service) = data.get_schedule_by_timetable_uid(&uid("X12345"), date(2019, 8, 12));
        assert_eq!(status, LookupStatus::ServiceNotFound);
        assert!(service.is_none());
    }

    #[test]
    fn outside_calendar_is_no_schedule() {
        let mut data = TimetableData::default();
        data.add_schedule(schedule("X12345", "SW", "SW123400", "10:00", "10:20"));
        let (status, _) = data.get_schedule_by_timetable_uid(&uid("X12345"), date(2019, 9, 2));
        assert_eq!(status, LookupStatus::NoScheduleOnDate);
    }

    #[test]
    fn duplicate_is_reported_and_first_kept() {
        let mut data = TimetableData::default();
        assert_eq!(
            data.add_schedule(schedule("X12345", "SW", "SW123400", "10:00", "10:20")),
            AddOutcome::Added
        );
        assert_eq!(
            data.add_schedule(schedule("X12345", "SW", "SW123400", "11:00", "11:20")),
            AddOutcome::Duplicate
        );

        let (_, service) = data.get_schedule_by_timetable_uid(&uid("X12345"), date(2019, 8, 12));
        let departs = service.unwrap().origin_departure().unwrap();
        assert_eq!(departs.time(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn retail_lookup_finds_every_portion() {
        let mut data = TimetableData::default();
        data.add_schedule(schedule("X12345", "SW", "SW123401", "10:00", "10:20"));
        data.add_schedule(schedule("X12346", "SW", "SW123402", "09:00", "09:20"));
        data.add_schedule(schedule("X99999", "SW", "SW999900", "09:00", "09:20"));

        let id = RetailServiceId::parse("SW123401").unwrap();
        let (status, services) = data.get_schedule_by_retail_service_id(&id, date(2019, 8, 12));
        assert_eq!(status, LookupStatus::Success);
        let uids: Vec<TimetableUid> = services.iter().map(ResolvedService::uid).collect();
        assert_eq!(uids, vec![uid("X12346"), uid("X12345")]);
    }

    #[test]
    fn toc_lookup_attributes_late_services_by_boundary() {
        let mut data = TimetableData::default();
        data.add_schedule(schedule("X00001", "SW", "SW000100", "10:00", "10:20"));
        data.add_schedule(schedule("X00002", "SW", "SW000200", "01:30", "01:50"));
        data.add_schedule(schedule("X00003", "GW", "GW000300", "10:00", "10:20"));

        let toc = Toc::parse("SW").unwrap();
        let on = date(2019, 8, 12);

        let (_, midnight) = data.get_schedules_by_toc(&toc, on, None);
        assert_eq!(midnight.len(), 2);
        assert!(midnight.iter().all(|s| s.on() == on));

        let boundary = NaiveTime::from_hms_opt(3, 0, 0);
        let (status, shifted) = data.get_schedules_by_toc(&toc, on, boundary);
        assert_eq!(status, LookupStatus::Success);
        let found: Vec<(TimetableUid, NaiveDate)> = shifted.iter().map(|s| (s.uid(), s.on())).collect();
        assert_eq!(
            found,
            vec![(uid("X00001"), on), (uid("X00002"), date(2019, 8, 13))]
        );

        let (status, _) = data.get_schedules_by_toc(&Toc::parse("XC").unwrap(), on, None);
        assert_eq!(status, LookupStatus::ServiceNotFound);
    }

    #[test]
    fn associations_with_unknown_services_are_dropped() {
        let mut data = TimetableData::default();
        data.add_schedule(schedule("X12345", "SW", "SW123400", "10:00", "10:20"));

        let association = |other: &str| Association {
            main: AssociationEnd::new(uid("X12345")),
            associated: AssociationEnd::new(uid(other)),
            location: tiploc("SURBITN"),
            calendar: every_day(),
            stp: StpIndicator::Permanent,
            category: AssociationCategory::NextPrevious,
            date_indicator: DateIndicator::Standard,
            is_passenger: true,
        };
        data.add_schedule(schedule("A98765", "SW", "SW987600", "11:00", "11:20"));

        let counts = data.add_associations([
            association("A98765"),
            association("B11111"),
            association("A98765"),
        ]);
        assert_eq!(
            counts,
            AttachCounts {
                attached: 1,
                dropped: 1,
                duplicates: 1,
            }
        );
        assert!(data.service(&uid("X12345")).unwrap().has_associations());
        assert!(data.service(&uid("A98765")).unwrap().has_associations());
    }

    #[test]
    fn location_index_covers_every_version() {
        let mut data = TimetableData::default();
        data.add_schedule(schedule("X12345", "SW", "SW123400", "10:00", "10:20"));
        let at: Vec<TimetableUid> = data.services_at(&tiploc("SURBITN")).collect();
        assert_eq!(at, vec![uid("X12345")]);
        assert_eq!(data.services_at(&tiploc("CLPHMJN")).count(), 0);
    }
}
