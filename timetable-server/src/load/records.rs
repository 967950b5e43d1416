//! Typed records of the timetable archive.
//!
//! The archive is JSON lines, one record per line, tagged by `"type"`:
//!
//! ```json
//! {"type": "location", "tiploc": "SURBITN", "crs": "SUR", "name": "SURBITON"}
//! ```

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{
    Activities, BankHolidayPolicy, Calendar, CalendarError, Crs, DayMask, RetailServiceId,
    ScheduleTime, StpIndicator, Tiploc, TimetableUid, Toc,
};
use crate::timetable::{AssociationCategory, DateIndicator, LocationKind, ScheduleLocation};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Schedule(ScheduleRecord),
    Association(AssociationRecord),
    Location(LocationRecord),
}

/// Calendar fields shared by schedules and associations.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRecord {
    pub runs_from: NaiveDate,
    pub runs_to: NaiveDate,
    /// Seven `0`/`1` characters, Monday first
    pub days: String,
    /// Blank, `X` or `G`
    #[serde(default)]
    pub bank_holiday: String,
}

impl CalendarRecord {
    pub fn to_calendar(&self) -> Result<Calendar, CalendarError> {
        Calendar::new(
            self.runs_from,
            self.runs_to,
            DayMask::parse(&self.days)?,
            BankHolidayPolicy::parse(&self.bank_holiday)?,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRecord {
    pub uid: TimetableUid,
    pub stp: StpIndicator,
    #[serde(flatten)]
    pub calendar: CalendarRecord,
    pub toc: Option<Toc>,
    pub retail_service_id: Option<RetailServiceId>,
    pub train_identity: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub seat_class: Option<String>,
    pub sleepers: Option<String>,
    pub reservations: Option<String>,
    pub catering: Option<String>,
    #[serde(default)]
    pub locations: Vec<StopRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopRecord {
    pub kind: LocationKind,
    pub tiploc: Tiploc,
    /// Position in the stop list when absent
    pub sequence: Option<u16>,
    pub public_arrival: Option<ScheduleTime>,
    pub public_departure: Option<ScheduleTime>,
    pub working_arrival: Option<ScheduleTime>,
    pub working_departure: Option<ScheduleTime>,
    pub working_pass: Option<ScheduleTime>,
    pub platform: Option<String>,
    #[serde(default)]
    pub activities: Activities,
}

impl StopRecord {
    pub fn into_location(self, position: usize) -> ScheduleLocation {
        let sequence = self
            .sequence
            .unwrap_or_else(|| u16::try_from(position + 1).unwrap_or(u16::MAX));
        ScheduleLocation {
            kind: self.kind,
            location: self.tiploc,
            sequence,
            public_arrival: self.public_arrival,
            public_departure: self.public_departure,
            working_arrival: self.working_arrival,
            working_departure: self.working_departure,
            working_pass: self.working_pass,
            platform: self.platform.filter(|p| !p.trim().is_empty()),
            activities: self.activities,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociationRecord {
    pub main_uid: TimetableUid,
    pub associated_uid: TimetableUid,
    pub main_sequence: Option<u8>,
    pub associated_sequence: Option<u8>,
    pub location: Tiploc,
    #[serde(flatten)]
    pub calendar: CalendarRecord,
    pub stp: StpIndicator,
    #[serde(default)]
    pub category: AssociationCategory,
    #[serde(default)]
    pub date_indicator: DateIndicator,
    /// `P` in the feed
    #[serde(default)]
    pub passenger: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub tiploc: Tiploc,
    pub crs: Option<Crs>,
    pub nlc: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Parse one archive line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Record>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schedule_line() {
        let line = r#"{
            "type": "schedule", "uid": "X12345", "stp": "P",
            "runs_from": "2019-08-01", "runs_to": "2019-08-31", "days": "1111100",
            "toc": "SW", "retail_service_id": "SW123400",
            "locations": [
                {"kind": "origin", "tiploc": "WATRLMN", "public_departure": "10:00", "activities": "TB"},
                {"kind": "pass", "tiploc": "CLPHMJN", "working_pass": "10:06:30"},
                {"kind": "destination", "tiploc": "SURBITN", "public_arrival": "10:20", "platform": " "}
            ]
        }"#;
        let Some(Record::Schedule(record)) = parse_line(&line.replace('\n', " ")).unwrap() else {
            panic!("expected a schedule record");
        };

        assert_eq!(record.uid, TimetableUid::parse("X12345").unwrap());
        assert_eq!(record.stp, StpIndicator::Permanent);
        assert_eq!(record.calendar.to_calendar().unwrap().days(), DayMask::WEEKDAYS);
        assert_eq!(record.locations.len(), 3);

        let stops: Vec<ScheduleLocation> = record
            .locations
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.into_location(i))
            .collect();
        assert_eq!(stops[1].kind, LocationKind::Pass);
        assert_eq!(stops[1].sequence, 2);
        assert!(stops[2].platform.is_none());
    }

    #[test]
    fn parse_association_line() {
        let line = r#"{"type": "association", "main_uid": "X12345", "associated_uid": "A98765", "location": "CLPHMJN", "runs_from": "2019-08-01", "runs_to": "2019-08-31", "days": "1111100", "stp": "P", "category": "JJ", "date_indicator": "N", "passenger": true}"#;
        let Some(Record::Association(record)) = parse_line(line).unwrap() else {
            panic!("expected an association record");
        };
        assert_eq!(record.category, AssociationCategory::Join);
        assert_eq!(record.date_indicator, DateIndicator::NextDay);
        assert!(record.passenger);
    }

    #[test]
    fn blank_and_bad_lines() {
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line(r#"{"type": "unknown"}"#).is_err());
        assert!(parse_line(r#"{"type": "location", "tiploc": "toolongtiploc"}"#).is_err());
    }

    #[test]
    fn calendar_record_validates() {
        let record = CalendarRecord {
            runs_from: NaiveDate::from_ymd_opt(2019, 8, 31).unwrap(),
            runs_to: NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
            days: "1111100".into(),
            bank_holiday: String::new(),
        };
        assert!(matches!(record.to_calendar(), Err(CalendarError::InvalidRange { .. })));

        let record = CalendarRecord {
            days: "11111".into(),
            ..record
        };
        assert!(matches!(record.to_calendar(), Err(CalendarError::InvalidDayMask(_))));
    }
}
