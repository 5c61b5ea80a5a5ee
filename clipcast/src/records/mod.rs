//! Durable publish records.
//!
//! One record per accepted upload, written to the internal persistence
//! endpoint and never mutated afterwards. Records are owned by the backing
//! store; nothing is cached here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::instrument;

use platform_publishers::{Platform, PublishError, UploadMetadata};

/// Marker serialized for an upload that was accepted but whose identifier
/// could not be confirmed.
const UNRESOLVED_MARKER: &str = "unresolved";

/// The platform-assigned identifier, or the explicit unresolved marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalId {
    Resolved(String),
    Unresolved,
}

impl ExternalId {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(id) => id,
            Self::Unresolved => UNRESOLVED_MARKER,
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl Serialize for ExternalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExternalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value.is_empty() {
            return Err(D::Error::custom("external_id must not be empty"));
        }
        Ok(if value == UNRESOLVED_MARKER {
            Self::Unresolved
        } else {
            Self::Resolved(value)
        })
    }
}

/// The durable record of one completed publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub clip_id: String,
    pub platform: Platform,
    pub external_id: ExternalId,
    pub url: Option<String>,
    pub metadata: UploadMetadata,
    pub published_at: DateTime<Utc>,
}

/// Persists publish records to the backing store.
#[async_trait]
pub trait PublishRecordWriter: Send + Sync {
    async fn save(&self, record: &PublishRecord) -> Result<(), PublishError>;
}

/// POST-per-record writer against the internal persistence endpoint.
pub struct HttpRecordWriter {
    client: Client,
    endpoint: String,
}

impl HttpRecordWriter {
    pub fn new<E: Into<String>>(client: Client, endpoint: E) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PublishRecordWriter for HttpRecordWriter {
    #[instrument(skip(self, record), fields(platform = %record.platform, clip_id = %record.clip_id))]
    async fn save(&self, record: &PublishRecord) -> Result<(), PublishError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| PublishError::Persistence(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Persistence(format!(
                "record endpoint returned {status}"
            )));
        }
        Ok(())
    }
}
