//! Scenario tests for departures and arrivals boards.

use super::*;
use crate::domain::{
    BankHolidayPolicy, Calendar, Crs, DayMask, ScheduleTime, StpIndicator, Tiploc, TimetableUid, Toc,
};
use crate::location::Location;
use crate::timetable::{
    Association, AssociationCategory, AssociationEnd, DateIndicator, Schedule, ScheduleDetails,
    ScheduleLocation,
};
use chrono::{Duration, NaiveDate, NaiveTime};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 8, 12).unwrap()
}

fn at(s: &str) -> NaiveDateTime {
    date().and_time(NaiveTime::parse_from_str(s, "%H:%M").unwrap())
}

fn time(s: &str) -> ScheduleTime {
    ScheduleTime::parse(s).unwrap()
}

fn tiploc(s: &str) -> Tiploc {
    Tiploc::parse(s).unwrap()
}

fn crs(s: &str) -> Crs {
    Crs::parse(s).unwrap()
}

fn uid(s: &str) -> TimetableUid {
    TimetableUid::parse(s).unwrap()
}

fn august() -> Arc<Calendar> {
    Arc::new(
        Calendar::new(
            NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 8, 31).unwrap(),
            DayMask::EVERY_DAY,
            BankHolidayPolicy::RunsOnBankHoliday,
        )
        .unwrap(),
    )
}

fn locations() -> LocationData {
    let mut data = LocationData::new();
    for (t, c, name) in [
        ("WATRLMN", "WAT", "London Waterloo"),
        ("CLPHMJN", "CLJ", "Clapham Junction"),
        ("SURBITN", "SUR", "Surbiton"),
        ("WOKING", "WOK", "Woking"),
        ("GUILDFD", "GLD", "Guildford"),
        ("BSNGSTK", "BSK", "Basingstoke"),
        ("ESHER", "ESH", "Esher"),
    ] {
        data.add_location(Location::new(tiploc(t), Some(crs(c)), name));
    }
    data
}

/// A running schedule from `(tiploc, arrival, departure)` triples.
fn schedule(
    id: &str,
    stp: StpIndicator,
    calendar: Arc<Calendar>,
    toc: &str,
    calls: &[(&str, &str, &str)],
) -> Schedule {
    let last = calls.len() - 1;
    let stops = calls
        .iter()
        .enumerate()
        .map(|(i, (location, arr, dep))| {
            let sequence = u16::try_from(i + 1).unwrap();
            match i {
                0 => ScheduleLocation::origin(tiploc(location), sequence, time(dep)),
                i if i == last => ScheduleLocation::destination(tiploc(location), sequence, time(arr)),
                _ => ScheduleLocation::stop(tiploc(location), sequence, time(arr), time(dep)),
            }
        })
        .collect();
    let details = ScheduleDetails {
        toc: Some(Toc::parse(toc).unwrap()),
        ..ScheduleDetails::default()
    };
    Schedule::new(uid(id), stp, calendar, details, stops).unwrap()
}

/// Services from Surbiton to Woking every 15 minutes from 07:00 for a day.
fn quarter_hourly() -> TimetableData {
    let mut data = TimetableData::default();
    let first = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
    for i in 0..96 {
        let departs = first + Duration::minutes(15 * i);
        let arrives = departs + Duration::minutes(20);
        let dep = departs.format("%H:%M").to_string();
        let arr = arrives.format("%H:%M").to_string();
        data.add_schedule(schedule(
            &format!("X{:05}", i + 1),
            StpIndicator::Permanent,
            august(),
            "SW",
            &[("SURBITN", "", dep.as_str()), ("WOKING", arr.as_str(), "")],
        ));
    }
    data
}

fn times(calls: &[ResolvedServiceStop], kind: BoardKind) -> Vec<NaiveDateTime> {
    calls
        .iter()
        .map(|c| match kind {
            BoardKind::Departures => c.departure().unwrap(),
            BoardKind::Arrivals => c.arrival().unwrap(),
        })
        .collect()
}

#[test]
fn departures_window_around_target() {
    let timetable = quarter_hourly();
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_departures("SUR", at("10:00"), &GatherConfig::new(1, 5));

    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls.len(), 6);
    assert_eq!(
        times(&calls, BoardKind::Departures),
        vec![at("09:45"), at("10:00"), at("10:15"), at("10:30"), at("10:45"), at("11:00")]
    );
}

#[test]
fn full_day_returns_every_call_on_the_date() {
    let timetable = quarter_hourly();
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_departures("SUR", at("10:00"), &GatherConfig::full_day());
    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls.len(), 96);
    assert!(calls.iter().all(|c| c.departure().unwrap().date() == date()));
    assert_eq!(calls.first().unwrap().departure(), Some(at("00:00")));
}

#[test]
fn arrivals_use_arrival_times() {
    let timetable = quarter_hourly();
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_arrivals("WOK", at("10:00"), &GatherConfig::new(2, 2));
    assert_eq!(status, FindStatus::Success);
    assert_eq!(
        times(&calls, BoardKind::Arrivals),
        vec![at("09:35"), at("09:50"), at("10:05"), at("10:20")]
    );

    // Woking is only ever a destination
    let (status, calls) = gatherer.find_departures("WOK", at("10:00"), &GatherConfig::new(2, 2));
    assert_eq!(status, FindStatus::NoServicesForLocation);
    assert!(calls.is_empty());
}

#[test]
fn unknown_station_and_quiet_station() {
    let timetable = quarter_hourly();
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, _) = gatherer.find_departures("ZZZ", at("10:00"), &GatherConfig::default());
    assert_eq!(status, FindStatus::LocationNotFound);

    let (status, _) = gatherer.find_departures("ESH", at("10:00"), &GatherConfig::default());
    assert_eq!(status, FindStatus::NoServicesForLocation);

    let config = GatherConfig::default().with_via("ZZZ");
    let (status, _) = gatherer.find_departures("SUR", at("10:00"), &config);
    assert_eq!(status, FindStatus::LocationNotFound);
}

#[test]
fn station_found_by_tiploc() {
    let timetable = quarter_hourly();
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_departures("surbitn", at("10:00"), &GatherConfig::new(0, 1));
    assert_eq!(status, FindStatus::Success);
    assert_eq!(times(&calls, BoardKind::Departures), vec![at("10:00")]);
}

#[test]
fn toc_filter_applies_before_windowing() {
    let mut timetable = TimetableData::default();
    timetable.add_schedule(schedule(
        "A00001",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[("SURBITN", "", "10:00"), ("WOKING", "10:20", "")],
    ));
    timetable.add_schedule(schedule(
        "A00002",
        StpIndicator::Permanent,
        august(),
        "GW",
        &[("SURBITN", "", "10:05"), ("WOKING", "10:25", "")],
    ));
    timetable.add_schedule(schedule(
        "A00003",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[("SURBITN", "", "10:10"), ("WOKING", "10:30", "")],
    ));
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let config = GatherConfig::new(0, 2).with_toc(Toc::parse("SW").unwrap());
    let (_, calls) = gatherer.find_departures("SUR", at("10:00"), &config);
    let uids: Vec<TimetableUid> = calls.iter().map(|c| c.service().uid()).collect();
    assert_eq!(uids, vec![uid("A00001"), uid("A00003")]);
}

#[test]
fn ties_break_on_uid() {
    let mut timetable = TimetableData::default();
    for id in ["B00002", "B00001"] {
        timetable.add_schedule(schedule(
            id,
            StpIndicator::Permanent,
            august(),
            "SW",
            &[("SURBITN", "", "10:00"), ("WOKING", "10:20", "")],
        ));
    }
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (_, calls) = gatherer.find_departures("SUR", at("10:00"), &GatherConfig::new(0, 5));
    let uids: Vec<TimetableUid> = calls.iter().map(|c| c.service().uid()).collect();
    assert_eq!(uids, vec![uid("B00001"), uid("B00002")]);
}

#[test]
fn cancelled_calls_only_when_asked() {
    let mut timetable = TimetableData::default();
    timetable.add_schedule(schedule(
        "C00001",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[("SURBITN", "", "10:00"), ("WOKING", "10:20", "")],
    ));
    timetable.add_schedule(
        Schedule::new(
            uid("C00001"),
            StpIndicator::Cancelled,
            Arc::new(Calendar::single_day(date())),
            ScheduleDetails::default(),
            vec![],
        )
        .unwrap(),
    );
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_departures("SUR", at("09:00"), &GatherConfig::default());
    assert_eq!(status, FindStatus::NoServicesForLocation);
    assert!(calls.is_empty());

    let config = GatherConfig::default().including_cancelled();
    let (status, calls) = gatherer.find_departures("SUR", at("09:00"), &config);
    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_cancelled());
    assert_eq!(calls[0].departure(), Some(at("10:00")));
}

#[test]
fn overnight_service_from_previous_day_appears() {
    let mut timetable = TimetableData::default();
    timetable.add_schedule(schedule(
        "N00001",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[("WATRLMN", "", "23:45"), ("SURBITN", "00:05", "00:06"), ("WOKING", "00:30", "")],
    ));
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_departures("SUR", at("00:00"), &GatherConfig::new(0, 1));
    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls[0].service().on(), date() - Duration::days(1));
    assert_eq!(calls[0].departure(), Some(at("00:06")));

    // the same train's 23:45 start belongs to the query date
    let (_, calls) = gatherer.find_departures("WAT", at("23:00"), &GatherConfig::new(0, 5));
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service().on(), date());
}

#[test]
fn via_follows_split_portions() {
    let mut timetable = TimetableData::default();
    timetable.add_schedule(schedule(
        "X12345",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[
            ("WATRLMN", "", "10:00"),
            ("WOKING", "10:30", "10:35"),
            ("BSNGSTK", "10:55", ""),
        ],
    ));
    timetable.add_schedule(schedule(
        "A98765",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[("WOKING", "", "10:40"), ("GUILDFD", "10:50", "")],
    ));
    timetable.add_schedule(schedule(
        "D00001",
        StpIndicator::Permanent,
        august(),
        "SW",
        &[("WATRLMN", "", "10:05"), ("CLPHMJN", "10:12", "10:13"), ("SURBITN", "10:25", "")],
    ));
    timetable.add_associations([Association {
        main: AssociationEnd::new(uid("X12345")),
        associated: AssociationEnd::new(uid("A98765")),
        location: tiploc("WOKING"),
        calendar: august(),
        stp: StpIndicator::Permanent,
        category: AssociationCategory::Split,
        date_indicator: DateIndicator::Standard,
        is_passenger: true,
    }]);
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let config = GatherConfig::new(0, 5).with_via("GLD");
    let (status, calls) = gatherer.find_departures("WAT", at("09:00"), &config);
    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service().uid(), uid("X12345"));

    let config = GatherConfig::new(0, 5).with_via("WAT");
    let (_, calls) = gatherer.find_arrivals("GLD", at("09:00"), &config);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service().uid(), uid("A98765"));

    let config = GatherConfig::new(0, 5).with_via("SUR");
    let (_, calls) = gatherer.find_departures("WAT", at("09:00"), &config);
    let uids: Vec<TimetableUid> = calls.iter().map(|c| c.service().uid()).collect();
    assert_eq!(uids, vec![uid("D00001")]);
}

#[test]
fn failures_alone_report_error() {
    let last_day = NaiveDate::MAX;
    let mut timetable = TimetableData::default();
    timetable.add_schedule(schedule(
        "E00001",
        StpIndicator::Permanent,
        Arc::new(Calendar::single_day(last_day)),
        "SW",
        &[("SURBITN", "", "23:00"), ("WOKING", "01:00", "")],
    ));
    let locations = locations();
    let gatherer = Gatherer::new(&timetable, &locations);

    let (status, calls) = gatherer.find_arrivals(
        "WOK",
        last_day.and_hms_opt(12, 0, 0).unwrap(),
        &GatherConfig::default(),
    );
    assert_eq!(status, FindStatus::Error);
    assert!(calls.is_empty());

    // the rest of the service still resolves
    let (status, calls) = gatherer.find_departures(
        "SUR",
        last_day.and_hms_opt(12, 0, 0).unwrap(),
        &GatherConfig::default(),
    );
    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls.len(), 1);

    // one broken service does not hide the others
    timetable.add_schedule(schedule(
        "E00002",
        StpIndicator::Permanent,
        Arc::new(Calendar::single_day(last_day)),
        "SW",
        &[("SURBITN", "", "10:00"), ("WOKING", "10:30", "")],
    ));
    let gatherer = Gatherer::new(&timetable, &locations);
    let (status, calls) = gatherer.find_arrivals(
        "WOK",
        last_day.and_hms_opt(12, 0, 0).unwrap(),
        &GatherConfig::new(5, 5),
    );
    assert_eq!(status, FindStatus::Success);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service().uid(), uid("E00002"));
}
