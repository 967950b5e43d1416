//! Startup load: archive and enrichment sources, concurrently, under one
//! timeout.

use futures::future::join_all;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::BankHolidays;
use crate::location::{EnrichmentClient, EnrichmentClientConfig, LocationData, ReferenceNames};
use crate::timetable::TimetableData;

use super::builder::{LoadReport, TimetableBuilder};
use super::error::LoadError;

/// Everything a query needs, built once.
#[derive(Debug)]
pub struct Snapshot {
    pub timetable: TimetableData,
    pub locations: LocationData,
    pub report: LoadReport,
}

/// Load a JSON lines archive. Blocking.
///
/// An archive with no valid records at all is rejected as the wrong
/// format.
pub fn load_archive(path: &Path, bank_holidays: BankHolidays) -> Result<Snapshot, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut builder = TimetableBuilder::new(bank_holidays);
    let valid = builder.read(BufReader::new(file)).map_err(io_error)?;

    if valid == 0 {
        return Err(LoadError::WrongFormat {
            path: path.to_path_buf(),
            invalid: builder.report().invalid_records,
        });
    }

    let (timetable, locations, report) = builder.build();
    Ok(Snapshot {
        timetable,
        locations,
        report,
    })
}

pub async fn read_bank_holidays(path: &Path) -> Result<BankHolidays, LoadError> {
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let holidays: BankHolidays = serde_json::from_str(&body).map_err(|e| LoadError::BankHolidays {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), count = holidays.len(), "loaded bank holidays");
    Ok(holidays)
}

async fn load_timetable(config: &AppConfig) -> Result<Snapshot, LoadError> {
    let holidays = match &config.bank_holidays {
        Some(path) => read_bank_holidays(path).await?,
        None => BankHolidays::default(),
    };

    let archive = config.archive.clone();
    tokio::task::spawn_blocking(move || load_archive(&archive, holidays))
        .await
        .map_err(|e| LoadError::TaskFailed(e.to_string()))?
}

/// Fetch every enrichment source. Failed sources are logged and skipped;
/// the rest are merged in configuration order.
async fn fetch_names(config: &AppConfig) -> ReferenceNames {
    let mut names = ReferenceNames::default();
    if config.enrichment.is_empty() {
        return names;
    }

    let client = match EnrichmentClient::new(EnrichmentClientConfig::new(config.enrichment_api_key.clone())) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "enrichment disabled");
            return names;
        }
    };

    let results = join_all(config.enrichment.iter().map(|source| client.fetch(source))).await;

    for (source, result) in config.enrichment.iter().zip(results) {
        match result {
            Ok(found) => names.merge(found),
            Err(e) => warn!(?source, error = %e, "enrichment source failed, keeping known names"),
        }
    }

    names
}

/// Build the snapshot. The archive load and each enrichment source run
/// concurrently; missing the deadline or failing the archive is fatal.
pub async fn bootstrap(config: &AppConfig) -> Result<Snapshot, LoadError> {
    let started = Instant::now();

    let (snapshot, names) = tokio::time::timeout(config.load_timeout, async {
        futures::join!(load_timetable(config), fetch_names(config))
    })
    .await
    .map_err(|_| LoadError::Timeout(config.load_timeout))?;

    let mut snapshot = snapshot?;
    let applied = snapshot.locations.apply_names(&names);

    info!(
        services = snapshot.timetable.len(),
        locations = snapshot.locations.len(),
        names_applied = applied,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "snapshot ready"
    );
    Ok(snapshot)
}
