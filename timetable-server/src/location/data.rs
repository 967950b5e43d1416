//! The location gazetteer.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::{Crs, Tiploc, Toc};

use super::names::ReferenceNames;

/// One physical timing point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub tiploc: Tiploc,
    pub crs: Option<Crs>,
    /// National location code
    pub nlc: Option<String>,
    pub name: String,
}

impl Location {
    pub fn new(tiploc: Tiploc, crs: Option<Crs>, name: impl Into<String>) -> Self {
        Self {
            tiploc,
            crs,
            nlc: None,
            name: name.into(),
        }
    }
}

/// A user-facing station: every location sharing one CRS code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    pub crs: Crs,
    pub name: String,
    pub locations: Vec<Tiploc>,
}

/// Locations, stations and operator names.
#[derive(Debug, Clone, Default)]
pub struct LocationData {
    locations: HashMap<Tiploc, Location>,
    stations: HashMap<Crs, Station>,
    operators: HashMap<Toc, String>,
}

impl LocationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, grouping it under its station. Returns false if the
    /// TIPLOC was already known; the first definition is kept.
    pub fn add_location(&mut self, location: Location) -> bool {
        if self.locations.contains_key(&location.tiploc) {
            return false;
        }

        if let Some(crs) = location.crs {
            let station = self.stations.entry(crs).or_insert_with(|| Station {
                crs,
                name: location.name.clone(),
                locations: Vec::new(),
            });
            station.locations.push(location.tiploc);
        }

        self.locations.insert(location.tiploc, location);
        true
    }

    pub fn location(&self, tiploc: &Tiploc) -> Option<&Location> {
        self.locations.get(tiploc)
    }

    pub fn station(&self, crs: &Crs) -> Option<&Station> {
        self.stations.get(crs)
    }

    /// Find a station by CRS code, or by the TIPLOC of one of its
    /// locations.
    ///
    /// ```
    /// use timetable_server::domain::{Crs, Tiploc};
    /// use timetable_server::location::{Location, LocationData};
    ///
    /// let mut data = LocationData::new();
    /// let sur = Crs::parse("SUR").unwrap();
    /// data.add_location(Location::new(Tiploc::parse("SURBITN").unwrap(), Some(sur), "Surbiton"));
    ///
    /// assert_eq!(data.find_station("sur").unwrap().crs, sur);
    /// assert_eq!(data.find_station("SURBITN").unwrap().crs, sur);
    /// assert!(data.find_station("XYZ").is_none());
    /// ```
    pub fn find_station(&self, code: &str) -> Option<&Station> {
        if let Some(station) = Crs::parse_normalized(code).ok().and_then(|crs| self.stations.get(&crs)) {
            return Some(station);
        }

        let tiploc = Tiploc::parse(&code.trim().to_ascii_uppercase()).ok()?;
        let crs = self.locations.get(&tiploc)?.crs?;
        self.stations.get(&crs)
    }

    pub fn operator_name(&self, toc: &Toc) -> Option<&str> {
        self.operators.get(toc).map(String::as_str)
    }

    /// Back-fill display names. Identity keys never change; names for
    /// unknown stations or locations are ignored. Returns the number of
    /// names applied.
    pub fn apply_names(&mut self, names: &ReferenceNames) -> usize {
        let mut applied = 0;

        for (crs, name) in &names.stations {
            if let Some(station) = self.stations.get_mut(crs) {
                station.name.clone_from(name);
                applied += 1;
            }
        }

        for (tiploc, name) in &names.locations {
            if let Some(location) = self.locations.get_mut(tiploc) {
                location.name.clone_from(name);
                applied += 1;
            }
        }

        for (toc, name) in &names.operators {
            self.operators.insert(*toc, name.clone());
            applied += 1;
        }

        applied
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    fn tiploc(s: &str) -> Tiploc {
        Tiploc::parse(s).unwrap()
    }

    fn clapham() -> LocationData {
        let mut data = LocationData::new();
        data.add_location(Location::new(tiploc("CLPHMJN"), Some(crs("CLJ")), "CLAPHAM JUNCTION"));
        data.add_location(Location::new(tiploc("CLPHMJW"), Some(crs("CLJ")), "CLAPHAM JN WEST"));
        data.add_location(Location::new(tiploc("CLPHMJC"), None, "CLAPHAM JN SIDINGS"));
        data
    }

    #[test]
    fn station_groups_locations_by_crs() {
        let data = clapham();
        let station = data.station(&crs("CLJ")).unwrap();
        assert_eq!(station.locations, vec![tiploc("CLPHMJN"), tiploc("CLPHMJW")]);
        assert_eq!(station.name, "CLAPHAM JUNCTION");
        assert_eq!(data.len(), 3);
        assert_eq!(data.station_count(), 1);
    }

    #[test]
    fn duplicate_tiploc_keeps_first() {
        let mut data = clapham();
        assert!(!data.add_location(Location::new(tiploc("CLPHMJN"), Some(crs("XXX")), "Other")));
        assert!(data.station(&crs("XXX")).is_none());
        assert_eq!(data.location(&tiploc("CLPHMJN")).unwrap().name, "CLAPHAM JUNCTION");
    }

    #[test]
    fn find_station_by_tiploc_without_crs_fails() {
        let data = clapham();
        assert_eq!(data.find_station("clphmjw").unwrap().crs, crs("CLJ"));
        assert!(data.find_station("CLPHMJC").is_none());
        assert!(data.find_station("").is_none());
    }

    #[test]
    fn apply_names_never_changes_keys() {
        let mut data = clapham();
        let names = ReferenceNames::from_json(
            r#"{
                "stations": [{"crsCode": "CLJ", "name": "Clapham Junction"}, {"crsCode": "WAT", "name": "London Waterloo"}],
                "locations": [{"tiploc": "CLPHMJW", "name": "Clapham Junction West"}],
                "operators": [{"code": "SW", "name": "South Western Railway"}]
            }"#,
        )
        .unwrap();

        assert_eq!(data.apply_names(&names), 3);
        assert_eq!(data.station(&crs("CLJ")).unwrap().name, "Clapham Junction");
        assert!(data.station(&crs("WAT")).is_none());
        assert_eq!(data.location(&tiploc("CLPHMJW")).unwrap().name, "Clapham Junction West");
        assert_eq!(
            data.operator_name(&Toc::parse("SW").unwrap()),
            Some("South Western Railway")
        );
    }
}
