//! Data transfer objects for web requests and responses.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::Toc;
use crate::gather::{DEFAULT_AFTER, DEFAULT_BEFORE, FindStatus, GatherConfig};
use crate::location::LocationData;
use crate::timetable::{
    Endpoint, LookupStatus, ResolvedAssociation, ResolvedService, ResolvedServiceStop, ScheduleLocation,
};

/// Query parameters for a departures or arrivals board.
#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    /// Calls before the target time (default 0)
    pub before: Option<usize>,

    /// Calls at or after the target time (default 5)
    pub after: Option<usize>,

    /// Every call on the date; overrides before/after
    pub full_day: Option<bool>,

    /// Comma-separated operator codes
    pub toc: Option<String>,

    /// Station the train must continue to or have come from
    pub via: Option<String>,

    pub include_cancelled: Option<bool>,
}

impl BoardQuery {
    /// Build the gather configuration. Invalid operator codes are returned
    /// as the error.
    pub fn to_config(&self) -> Result<GatherConfig, String> {
        let mut config = if self.full_day.unwrap_or(false) {
            GatherConfig::full_day()
        } else {
            GatherConfig::new(
                self.before.unwrap_or(DEFAULT_BEFORE),
                self.after.unwrap_or(DEFAULT_AFTER),
            )
        };
        config.via = self.via.clone().filter(|v| !v.trim().is_empty());
        config.include_cancelled = self.include_cancelled.unwrap_or(false);

        for code in self.toc.iter().flat_map(|t| t.split(',')).map(str::trim).filter(|c| !c.is_empty()) {
            let toc = Toc::parse(&code.to_ascii_uppercase()).map_err(|_| code.to_string())?;
            config = config.with_toc(toc);
        }

        Ok(config)
    }
}

/// Query parameters for an operator lookup.
#[derive(Debug, Default, Deserialize)]
pub struct TocQuery {
    /// Operating day start, `HH:MM`
    pub boundary: Option<String>,
}

/// A resolved service.
#[derive(Debug, Serialize)]
pub struct ServiceResult {
    pub uid: String,
    pub date: NaiveDate,
    pub stp: String,
    pub is_cancelled: bool,
    pub toc: Option<String>,
    pub operator: Option<String>,
    pub retail_service_id: Option<String>,
    pub train_identity: Option<String>,
    /// Planned stops, including those of a cancelled version
    pub stops: Vec<StopResult>,
    pub associations: Vec<AssociationResult>,
}

impl ServiceResult {
    pub fn from_resolved(service: &ResolvedService, locations: &LocationData) -> Self {
        let schedule = service
            .cancelled_schedule()
            .filter(|_| service.is_cancelled())
            .unwrap_or(service.schedule());

        Self {
            uid: service.uid().to_string(),
            date: service.on(),
            stp: service.schedule().stp().code().to_string(),
            is_cancelled: service.is_cancelled(),
            toc: service.toc().map(|t| t.to_string()),
            operator: service
                .toc()
                .and_then(|t| locations.operator_name(&t))
                .map(str::to_string),
            retail_service_id: schedule.retail_service_id().map(|r| r.to_string()),
            train_identity: schedule.details().train_identity.clone(),
            stops: service
                .timetabled_stops()
                .iter()
                .filter(|s| s.is_advertised_stop())
                .map(|s| StopResult::from_location(s, service.on(), locations))
                .collect(),
            associations: service.associations().iter().map(AssociationResult::from_resolved).collect(),
        }
    }
}

/// One call in a service.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub tiploc: String,
    pub crs: Option<String>,
    pub name: Option<String>,
    pub arrival: Option<NaiveDateTime>,
    pub departure: Option<NaiveDateTime>,
    pub platform: Option<String>,
}

impl StopResult {
    fn from_location(stop: &ScheduleLocation, on: NaiveDate, locations: &LocationData) -> Self {
        let location = locations.location(&stop.location);
        Self {
            tiploc: stop.location.to_string(),
            crs: location.and_then(|l| l.crs).map(|c| c.to_string()),
            name: location.map(|l| l.name.clone()),
            arrival: stop.public_arrival.and_then(|t| t.on(on)),
            departure: stop.public_departure.and_then(|t| t.on(on)),
            platform: stop.platform.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssociationResult {
    pub category: String,
    pub partner_uid: String,
    pub location: String,
    /// The main train's date
    pub date: NaiveDate,
    pub is_main: bool,
    pub is_cancelled: bool,
    pub is_broken: bool,
}

impl AssociationResult {
    fn from_resolved(association: &ResolvedAssociation) -> Self {
        Self {
            category: association.category().code().to_string(),
            partner_uid: association.partner_uid().to_string(),
            location: association.location().to_string(),
            date: association.on(),
            is_main: association.is_main(),
            is_cancelled: association.is_cancelled(),
            is_broken: association.is_broken(),
        }
    }
}

/// Response to a lookup by UID, retail service id or operator.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub status: String,
    pub services: Vec<ServiceResult>,
}

pub fn lookup_status(status: LookupStatus) -> &'static str {
    match status {
        LookupStatus::Success => "success",
        LookupStatus::ServiceNotFound => "service_not_found",
        LookupStatus::NoScheduleOnDate => "no_schedule_on_date",
    }
}

/// A departures or arrivals board.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub status: String,
    pub calls: Vec<BoardCall>,
}

pub fn find_status(status: FindStatus) -> &'static str {
    match status {
        FindStatus::Success => "success",
        FindStatus::LocationNotFound => "location_not_found",
        FindStatus::NoServicesForLocation => "no_services_for_location",
        FindStatus::Error => "error",
    }
}

/// One line of a board.
#[derive(Debug, Serialize)]
pub struct BoardCall {
    pub uid: String,
    pub date: NaiveDate,
    pub toc: Option<String>,
    pub operator: Option<String>,
    pub tiploc: String,
    pub arrival: Option<NaiveDateTime>,
    pub departure: Option<NaiveDateTime>,
    pub platform: Option<String>,
    pub is_cancelled: bool,
    pub origins: Vec<EndpointResult>,
    pub destinations: Vec<EndpointResult>,
}

impl BoardCall {
    pub fn from_stop(call: &ResolvedServiceStop, locations: &LocationData) -> Self {
        let service = call.service();
        let stop = call.location();
        Self {
            uid: service.uid().to_string(),
            date: service.on(),
            toc: service.toc().map(|t| t.to_string()),
            operator: service
                .toc()
                .and_then(|t| locations.operator_name(&t))
                .map(str::to_string),
            tiploc: stop.location.to_string(),
            arrival: call.arrival(),
            departure: call.departure(),
            platform: stop.platform.clone(),
            is_cancelled: call.is_cancelled(),
            origins: endpoints(&call.effective_origins(), locations),
            destinations: endpoints(&call.effective_destinations(), locations),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EndpointResult {
    pub uid: String,
    pub tiploc: String,
    pub name: Option<String>,
    pub time: Option<NaiveDateTime>,
}

fn endpoints(endpoints: &[Endpoint], locations: &LocationData) -> Vec<EndpointResult> {
    endpoints
        .iter()
        .map(|e| EndpointResult {
            uid: e.uid.to_string(),
            tiploc: e.location.to_string(),
            name: locations.location(&e.location).map(|l| l.name.clone()),
            time: e.time,
        })
        .collect()
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gather::Window;

    #[test]
    fn board_query_defaults() {
        let config = BoardQuery::default().to_config().unwrap();
        assert_eq!(config, GatherConfig::default());
    }

    #[test]
    fn board_query_full() {
        let query = BoardQuery {
            before: Some(1),
            after: Some(3),
            full_day: None,
            toc: Some("sw, GW".into()),
            via: Some("WOK".into()),
            include_cancelled: Some(true),
        };
        let config = query.to_config().unwrap();
        assert_eq!(config.window, Window::Around { before: 1, after: 3 });
        assert_eq!(config.tocs, vec![Toc::parse("SW").unwrap(), Toc::parse("GW").unwrap()]);
        assert_eq!(config.via.as_deref(), Some("WOK"));
        assert!(config.include_cancelled);
    }

    #[test]
    fn board_query_full_day_and_bad_toc() {
        let query = BoardQuery {
            full_day: Some(true),
            before: Some(2),
            ..BoardQuery::default()
        };
        assert_eq!(query.to_config().unwrap().window, Window::FullDay);

        let query = BoardQuery {
            toc: Some("S!".into()),
            ..BoardQuery::default()
        };
        assert_eq!(query.to_config().unwrap_err(), "S!");
    }
}
