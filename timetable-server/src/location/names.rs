//! Reference display names from enrichment feeds.

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::{Crs, Tiploc, Toc};

/// Wire shape of an enrichment document. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ReferenceNamesDto {
    #[serde(default)]
    pub stations: Vec<StationDto>,
    #[serde(default)]
    pub locations: Vec<LocationNameDto>,
    #[serde(default)]
    pub operators: Vec<OperatorDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub crs_code: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNameDto {
    pub tiploc: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorDto {
    pub code: String,
    pub name: String,
}

/// Validated display names keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceNames {
    pub stations: HashMap<Crs, String>,
    pub locations: HashMap<Tiploc, String>,
    pub operators: HashMap<Toc, String>,
}

impl ReferenceNames {
    /// Build from a wire document, dropping entries with invalid codes.
    pub fn from_dto(dto: ReferenceNamesDto) -> Self {
        let stations = dto
            .stations
            .into_iter()
            .filter_map(|s| {
                // Feeds often use lowercase CRS codes
                Crs::parse_normalized(&s.crs_code).ok().map(|crs| (crs, s.name))
            })
            .collect();

        let locations = dto
            .locations
            .into_iter()
            .filter_map(|l| {
                Tiploc::parse(l.tiploc.trim().to_uppercase().as_str())
                    .ok()
                    .map(|t| (t, l.name))
            })
            .collect();

        let operators = dto
            .operators
            .into_iter()
            .filter_map(|o| {
                Toc::parse(o.code.trim().to_uppercase().as_str())
                    .ok()
                    .map(|t| (t, o.name))
            })
            .collect();

        Self {
            stations,
            locations,
            operators,
        }
    }

    /// Parse a JSON enrichment document.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<ReferenceNamesDto>(body).map(Self::from_dto)
    }

    /// Fold `other` into `self`; its names win on conflict.
    pub fn merge(&mut self, other: ReferenceNames) {
        self.stations.extend(other.stations);
        self.locations.extend(other.locations);
        self.operators.extend(other.operators);
    }

    pub fn len(&self) -> usize {
        self.stations.len() + self.locations.len() + self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
