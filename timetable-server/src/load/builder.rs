//! Single-writer construction of the timetable snapshot.

use std::io::BufRead;
use tracing::{info, warn};

use crate::domain::{BankHolidays, CalendarInterner};
use crate::location::{Location, LocationData};
use crate::timetable::{AddOutcome, Association, AssociationEnd, Schedule, ScheduleDetails, TimetableData};

use super::error::RecordError;
use super::records::{AssociationRecord, LocationRecord, Record, ScheduleRecord, parse_line};

/// Counts from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub schedules: usize,
    pub duplicates: usize,
    pub invalid_records: usize,
    pub associations_attached: usize,
    pub associations_dropped: usize,
    pub associations_duplicate: usize,
    pub locations: usize,
    pub calendars: usize,
}

/// Accumulates records into a timetable.
///
/// Associations are held back until [`TimetableBuilder::build`], so they
/// may appear anywhere in the stream relative to the schedules they link.
#[derive(Debug)]
pub struct TimetableBuilder {
    timetable: TimetableData,
    locations: LocationData,
    calendars: CalendarInterner,
    associations: Vec<Association>,
    report: LoadReport,
}

impl TimetableBuilder {
    pub fn new(bank_holidays: BankHolidays) -> Self {
        Self {
            timetable: TimetableData::new(bank_holidays),
            locations: LocationData::new(),
            calendars: CalendarInterner::new(),
            associations: Vec::new(),
            report: LoadReport::default(),
        }
    }

    /// Read every line of a JSON lines archive. Invalid lines are logged,
    /// counted and skipped. Returns the number of valid records.
    pub fn read(&mut self, reader: impl BufRead) -> std::io::Result<usize> {
        let mut valid = 0;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let result = parse_line(&line)
                .map_err(|source| RecordError::Json { line: i + 1, source })
                .and_then(|record| match record {
                    Some(record) => self.add_record(record).map(|()| true),
                    None => Ok(false),
                });

            match result {
                Ok(true) => valid += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(line = i + 1, error = %e, "skipping invalid record");
                    self.report.invalid_records += 1;
                }
            }
        }

        Ok(valid)
    }

    /// Counts so far.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn add_record(&mut self, record: Record) -> Result<(), RecordError> {
        match record {
            Record::Schedule(r) => self.add_schedule(r),
            Record::Association(r) => self.add_association(r),
            Record::Location(r) => {
                self.add_location(r);
                Ok(())
            }
        }
    }

    fn add_schedule(&mut self, record: ScheduleRecord) -> Result<(), RecordError> {
        let calendar = self.calendars.intern(record.calendar.to_calendar()?);
        let details = ScheduleDetails {
            toc: record.toc,
            retail_service_id: record.retail_service_id,
            train_identity: record.train_identity,
            status: record.status,
            category: record.category,
            seat_class: record.seat_class,
            sleepers: record.sleepers,
            reservations: record.reservations,
            catering: record.catering,
        };
        let locations = record
            .locations
            .into_iter()
            .enumerate()
            .map(|(i, stop)| stop.into_location(i))
            .collect();

        let schedule = Schedule::new(record.uid, record.stp, calendar, details, locations)?;
        match self.timetable.add_schedule(schedule) {
            AddOutcome::Added => self.report.schedules += 1,
            AddOutcome::Duplicate => self.report.duplicates += 1,
        }
        Ok(())
    }

    fn add_association(&mut self, record: AssociationRecord) -> Result<(), RecordError> {
        let calendar = self.calendars.intern(record.calendar.to_calendar()?);
        self.associations.push(Association {
            main: AssociationEnd {
                uid: record.main_uid,
                sequence: record.main_sequence,
            },
            associated: AssociationEnd {
                uid: record.associated_uid,
                sequence: record.associated_sequence,
            },
            location: record.location,
            calendar,
            stp: record.stp,
            category: record.category,
            date_indicator: record.date_indicator,
            is_passenger: record.passenger,
        });
        Ok(())
    }

    fn add_location(&mut self, record: LocationRecord) {
        let name = if record.name.trim().is_empty() {
            record.tiploc.to_string()
        } else {
            record.name
        };
        let location = Location {
            tiploc: record.tiploc,
            crs: record.crs,
            nlc: record.nlc,
            name,
        };
        if self.locations.add_location(location) {
            self.report.locations += 1;
        }
    }

    /// Attach held associations and hand over the finished snapshot. The
    /// calendar interner is dropped here.
    pub fn build(mut self) -> (TimetableData, LocationData, LoadReport) {
        let counts = self.timetable.add_associations(self.associations);
        self.report.associations_attached = counts.attached;
        self.report.associations_dropped = counts.dropped;
        self.report.associations_duplicate = counts.duplicates;
        self.report.calendars = self.calendars.len();

        info!(
            services = self.timetable.len(),
            schedules = self.report.schedules,
            duplicates = self.report.duplicates,
            invalid = self.report.invalid_records,
            associations = counts.attached,
            dropped_associations = counts.dropped,
            duplicate_associations = counts.duplicates,
            locations = self.report.locations,
            calendars = self.report.calendars,
            "timetable built"
        );

        (self.timetable, self.locations, self.report)
    }
}
