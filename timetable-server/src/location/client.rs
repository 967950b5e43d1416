//! Enrichment source client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::PathBuf;
use tracing::debug;

use super::error::EnrichmentError;
use super::names::ReferenceNames;

/// Where to fetch reference names from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentSource {
    Http(String),
    File(PathBuf),
}

impl EnrichmentSource {
    /// URLs with an `http`/`https` scheme are fetched, anything else is a
    /// local path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Http(s.to_string())
        } else {
            Self::File(PathBuf::from(s))
        }
    }
}

/// Configuration for the enrichment client.
#[derive(Debug, Clone)]
pub struct EnrichmentClientConfig {
    /// Sent as the `x-apikey` header when present
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl EnrichmentClientConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            timeout_secs: 30,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for EnrichmentClientConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Fetches reference names over HTTP or from disk.
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    http: reqwest::Client,
}

impl EnrichmentClient {
    pub fn new(config: EnrichmentClientConfig) -> Result<Self, EnrichmentError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| EnrichmentError::InvalidApiKey)?;
            headers.insert(HeaderName::from_static("x-apikey"), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http })
    }

    pub async fn fetch(&self, source: &EnrichmentSource) -> Result<ReferenceNames, EnrichmentError> {
        let body = match source {
            EnrichmentSource::Http(url) => self.fetch_http(url).await?,
            EnrichmentSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| EnrichmentError::Io {
                        path: path.clone(),
                        source,
                    })?
            }
        };

        let names = ReferenceNames::from_json(&body).map_err(|e| EnrichmentError::Json {
            message: e.to_string(),
        })?;
        debug!(?source, names = names.len(), "fetched reference names");
        Ok(names)
    }

    async fn fetch_http(&self, url: &str) -> Result<String, EnrichmentError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EnrichmentError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn source_parse() {
        assert_eq!(
            EnrichmentSource::parse("https://example.org/names.json"),
            EnrichmentSource::Http("https://example.org/names.json".into())
        );
        assert_eq!(
            EnrichmentSource::parse(" /data/names.json "),
            EnrichmentSource::File(PathBuf::from("/data/names.json"))
        );
    }

    #[test]
    fn config_defaults() {
        let config = EnrichmentClientConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.with_timeout_secs(5).timeout_secs, 5);
    }

    #[test]
    fn rejects_unprintable_api_key() {
        let config = EnrichmentClientConfig::new(Some("bad\nkey".into()));
        assert!(matches!(
            EnrichmentClient::new(config),
            Err(EnrichmentError::InvalidApiKey)
        ));
    }

    #[tokio::test]
    async fn fetch_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"operators": [{{"code": "SW", "name": "South Western Railway"}}]}}"#).unwrap();

        let client = EnrichmentClient::new(EnrichmentClientConfig::default()).unwrap();
        let names = client
            .fetch(&EnrichmentSource::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(names.operators.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let client = EnrichmentClient::new(EnrichmentClientConfig::default()).unwrap();
        let err = client
            .fetch(&EnrichmentSource::File(PathBuf::from("/nonexistent/names.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Io { .. }));
    }
}
