//! Application configuration from the environment.

use url::Url;

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:clipcast.db?mode=rwc";

/// Default internal persistence endpoint for publish records.
pub const DEFAULT_RECORDS_ENDPOINT: &str = "http://127.0.0.1:8787/api/publish-records";

/// Default caption suggestion endpoint.
pub const DEFAULT_CAPTIONS_ENDPOINT: &str = "http://127.0.0.1:8787/api/captions";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub records_endpoint: String,
    pub captions_endpoint: String,
    pub log_filter: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> crate::Result<Self> {
        let database_url = std::env::var("CLIPCAST_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let records_endpoint = std::env::var("CLIPCAST_RECORDS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_RECORDS_ENDPOINT.to_string());
        let captions_endpoint = std::env::var("CLIPCAST_CAPTIONS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_CAPTIONS_ENDPOINT.to_string());
        let log_filter = std::env::var("CLIPCAST_LOG").ok();

        for (name, endpoint) in [
            ("CLIPCAST_RECORDS_ENDPOINT", &records_endpoint),
            ("CLIPCAST_CAPTIONS_ENDPOINT", &captions_endpoint),
        ] {
            Url::parse(endpoint)
                .map_err(|e| crate::Error::config(format!("{name} is not a valid URL: {e}")))?;
        }

        Ok(Self {
            database_url,
            records_endpoint,
            captions_endpoint,
            log_filter,
        })
    }
}
