//! Location gazetteer and reference name enrichment.
//!
//! Locations (TIPLOCs) are grouped into user-facing stations by CRS code.
//! Display names can be back-filled from enrichment sources after load.

mod client;
mod data;
mod error;
mod names;

pub use client::{EnrichmentClient, EnrichmentClientConfig, EnrichmentSource};
pub use data::{Location, LocationData, Station};
pub use error::EnrichmentError;
pub use names::{LocationNameDto, OperatorDto, ReferenceNames, ReferenceNamesDto, StationDto};
