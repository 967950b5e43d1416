//! Departures and arrivals boards.
//!
//! A gather is a pure function over the timetable and location snapshot:
//! find every service touching the station, resolve it, pick out the calls
//! on the query date and window them around the target time.

mod board;
mod config;

#[cfg(test)]
mod gather_tests;

pub use config::{DEFAULT_AFTER, DEFAULT_BEFORE, GatherConfig, Window};

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{Tiploc, TimetableUid};
use crate::location::LocationData;
use crate::timetable::{ResolvedService, ResolvedServiceStop, TimetableData, shift_date};

use board::select_window;

/// Which side of a call a board is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    Departures,
    Arrivals,
}

/// Outcome of a gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindStatus {
    Success,
    LocationNotFound,
    /// The station exists but nothing qualifies.
    NoServicesForLocation,
    /// Nothing qualifies and at least one service failed to resolve.
    Error,
}

/// Runs gathers against one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Gatherer<'a> {
    timetable: &'a TimetableData,
    locations: &'a LocationData,
}

impl<'a> Gatherer<'a> {
    pub fn new(timetable: &'a TimetableData, locations: &'a LocationData) -> Self {
        Self {
            timetable,
            locations,
        }
    }

    pub fn find_departures(
        &self,
        station: &str,
        at: NaiveDateTime,
        config: &GatherConfig,
    ) -> (FindStatus, Vec<ResolvedServiceStop>) {
        self.gather(BoardKind::Departures, station, at, config)
    }

    pub fn find_arrivals(
        &self,
        station: &str,
        at: NaiveDateTime,
        config: &GatherConfig,
    ) -> (FindStatus, Vec<ResolvedServiceStop>) {
        self.gather(BoardKind::Arrivals, station, at, config)
    }

    pub fn gather(
        &self,
        kind: BoardKind,
        station: &str,
        at: NaiveDateTime,
        config: &GatherConfig,
    ) -> (FindStatus, Vec<ResolvedServiceStop>) {
        let Some(station) = self.locations.find_station(station) else {
            return (FindStatus::LocationNotFound, Vec::new());
        };

        let via = match &config.via {
            Some(code) => match self.locations.find_station(code) {
                Some(via) => Some(via.locations.as_slice()),
                None => return (FindStatus::LocationNotFound, Vec::new()),
            },
            None => None,
        };

        let uids: BTreeSet<TimetableUid> = station
            .locations
            .iter()
            .flat_map(|t| self.timetable.services_at(t))
            .collect();

        let date = at.date();
        let mut failures = 0;
        let mut calls = Vec::new();

        for uid in &uids {
            for on in [shift_date(date, -1), Some(date)].into_iter().flatten() {
                let (_, Some(service)) = self.timetable.get_schedule_by_timetable_uid(uid, on) else {
                    continue;
                };
                if service.is_cancelled() && !config.include_cancelled {
                    continue;
                }
                if !config.accepts_toc(service.toc()) {
                    continue;
                }

                let service = Arc::new(service);
                for index in candidate_indices(&service, &station.locations, kind) {
                    let call = match ResolvedServiceStop::new(service.clone(), index) {
                        Ok(call) => call,
                        Err(e) => {
                            warn!(uid = %uid, date = %on, error = %e, "skipping service on board");
                            failures += 1;
                            continue;
                        }
                    };

                    if !on_date(&call, kind, date) {
                        continue;
                    }
                    let via_ok = via.is_none_or(|via| match kind {
                        BoardKind::Departures => call.continues_to(via),
                        BoardKind::Arrivals => call.came_from(via),
                    });
                    if via_ok {
                        calls.push(call);
                    }
                }
            }
        }

        calls.sort_by_key(|c| (board_time(c, kind), c.service().uid()));
        let candidates = calls.len();
        let calls = select_window(calls, |c| board_time(c, kind).unwrap_or(NaiveDateTime::MIN), at, config.window);

        debug!(
            station = %station.crs,
            ?kind,
            services = uids.len(),
            candidates,
            failures,
            returned = calls.len(),
            "gathered board"
        );

        let status = if !calls.is_empty() {
            FindStatus::Success
        } else if failures > 0 && candidates == 0 {
            FindStatus::Error
        } else {
            FindStatus::NoServicesForLocation
        };
        (status, calls)
    }
}

/// Indices of advertised calls at `locations` with the time this board
/// needs.
fn candidate_indices<'s>(
    service: &'s ResolvedService,
    locations: &'s [Tiploc],
    kind: BoardKind,
) -> impl Iterator<Item = usize> + 's {
    service
        .timetabled_stops()
        .iter()
        .enumerate()
        .filter(move |(_, stop)| {
            let has_time = match kind {
                BoardKind::Departures => stop.public_departure.is_some(),
                BoardKind::Arrivals => stop.public_arrival.is_some(),
            };
            has_time && stop.is_advertised_stop() && locations.contains(&stop.location)
        })
        .map(|(i, _)| i)
}

fn board_time(call: &ResolvedServiceStop, kind: BoardKind) -> Option<NaiveDateTime> {
    match kind {
        BoardKind::Departures => call.departure(),
        BoardKind::Arrivals => call.arrival(),
    }
}

fn on_date(call: &ResolvedServiceStop, kind: BoardKind, date: NaiveDate) -> bool {
    board_time(call, kind).is_some_and(|t| t.date() == date)
}
