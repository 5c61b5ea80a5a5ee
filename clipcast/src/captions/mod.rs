//! Caption suggestion service.
//!
//! One blocking request that derives a suggested title/description pair
//! from a clip. The result is offered, never forced: applying it to the
//! per-platform metadata is an explicit caller action
//! ([`crate::orchestrator::PublishJobDraft::accept_suggestion`]).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use platform_publishers::PublishError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSuggestion {
    pub title: String,
    pub description: String,
}

pub struct CaptionService {
    client: Client,
    endpoint: String,
}

impl CaptionService {
    pub fn new<E: Into<String>>(client: Client, endpoint: E) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Fetch a suggestion for the clip. Idempotent; re-invocable.
    #[instrument(skip(self))]
    pub async fn generate(&self, clip_id: &str) -> Result<CaptionSuggestion, PublishError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "clip_id": clip_id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::platform_api(
                format!("caption service returned {status}"),
                Some(status.as_u16()),
            ));
        }

        Ok(response.json().await?)
    }
}
