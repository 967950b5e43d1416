//! Enrichment error types.

use std::path::PathBuf;

/// Errors fetching reference names from an enrichment source.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed
    #[error("unauthorized: check TIMETABLE_ENRICHMENT_API_KEY")]
    Unauthorized,

    /// Source returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// API key cannot be sent as a header
    #[error("invalid API key format")]
    InvalidApiKey,

    /// Failed to read a local source
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
