//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::location::EnrichmentSource;

/// Default load timeout: 5 minutes.
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 300;

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON lines timetable archive
    pub archive: PathBuf,
    pub bank_holidays: Option<PathBuf>,
    pub enrichment: Vec<EnrichmentSource>,
    pub enrichment_api_key: Option<String>,
    /// Whole load phase, archive and enrichment together
    pub load_timeout: Duration,
    pub bind: SocketAddr,
}

impl AppConfig {
    /// A configuration with defaults for everything but the archive.
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            bank_holidays: None,
            enrichment: Vec::new(),
            enrichment_api_key: None,
            load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let archive = get("TIMETABLE_ARCHIVE").ok_or(ConfigError::Missing("TIMETABLE_ARCHIVE"))?;
        let mut config = Self::new(archive);

        config.bank_holidays = get("TIMETABLE_BANK_HOLIDAYS").map(PathBuf::from);
        config.enrichment = get("TIMETABLE_ENRICHMENT")
            .map(|v| {
                v.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(EnrichmentSource::parse)
                    .collect()
            })
            .unwrap_or_default();
        config.enrichment_api_key = get("TIMETABLE_ENRICHMENT_API_KEY");

        if let Some(value) = get("TIMETABLE_LOAD_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "TIMETABLE_LOAD_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.load_timeout = Duration::from_secs(secs);
        }

        let bind = get("TIMETABLE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        config.bind = bind.trim().parse().map_err(|_| ConfigError::Invalid {
            name: "TIMETABLE_BIND",
            value: bind.clone(),
        })?;

        Ok(config)
    }
}
