//! Social-page host publisher.
//!
//! Uploads go straight to the selected page's video endpoint as one
//! multipart request. Page selection is mandatory and is validated before
//! any network traffic.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::AuthorizationFlow;
use crate::publisher::error::PublishError;
use crate::publisher::platform_publisher::{
    PlatformPublisher, Publisher, SignIn, error_from_response,
};
use crate::types::{
    Clip, PageSelection, Platform, PlatformCredential, Profile, UploadMetadata, UploadResult,
};

use super::models::{CreatedVideo, MeResponse, PageListResponse};

#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub graph_base: String,
    pub watch_base: String,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            graph_base: "https://graph.facebook.com/v19.0".to_string(),
            watch_base: "https://www.facebook.com".to_string(),
        }
    }
}

pub struct FacebookPublisher {
    publisher: Publisher,
    config: FacebookConfig,
    auth: Arc<dyn AuthorizationFlow>,
}

impl FacebookPublisher {
    pub fn new(client: Client, auth: Arc<dyn AuthorizationFlow>) -> Self {
        Self::with_config(client, FacebookConfig::default(), auth)
    }

    pub fn with_config(
        client: Client,
        config: FacebookConfig,
        auth: Arc<dyn AuthorizationFlow>,
    ) -> Self {
        Self {
            publisher: Publisher::new(Platform::Facebook, client),
            config,
            auth,
        }
    }

    /// Pages the signed-in user can publish to. One of these must be
    /// selected before an upload is attempted.
    pub async fn list_pages(&self, user_token: &str) -> Result<Vec<PageSelection>, PublishError> {
        let url = format!("{}/me/accounts", self.config.graph_base);
        let response = self
            .publisher
            .get(&url)
            .bearer_auth(user_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let listing: PageListResponse = response.json().await?;
        Ok(listing
            .data
            .into_iter()
            .map(|page| PageSelection {
                page_id: page.id,
                page_name: page.name,
                access_token: page.access_token,
            })
            .collect())
    }
}

#[async_trait]
impl PlatformPublisher for FacebookPublisher {
    fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    async fn sign_in(&self) -> Result<SignIn, PublishError> {
        let grant = self.auth.authorize().await?;
        let credential = PlatformCredential::PageAccount {
            user_token: grant.access_token,
            selected_page: None,
        };
        let profile = self.fetch_profile(&credential).await?;
        Ok(SignIn {
            credential,
            profile,
        })
    }

    async fn fetch_profile(
        &self,
        credential: &PlatformCredential,
    ) -> Result<Profile, PublishError> {
        let token = credential
            .user_token()
            .ok_or_else(|| PublishError::Validation("credential is not a page account".into()))?;

        let url = format!("{}/me", self.config.graph_base);
        let response = self
            .publisher
            .get(&url)
            .query(&[("fields", "name,picture")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let me: MeResponse = response.json().await?;
        Ok(Profile {
            display_name: me.name,
            avatar_url: me.picture.map(|p| p.data.url).unwrap_or_default(),
        })
    }

    #[instrument(skip(self, metadata, credential), fields(clip_id = %clip.id))]
    async fn upload(
        &self,
        clip: &Clip,
        metadata: &UploadMetadata,
        credential: &PlatformCredential,
    ) -> Result<UploadResult, PublishError> {
        // Pre-flight: a page account without a selection never reaches the
        // network.
        let page = credential
            .selected_page()
            .ok_or_else(|| PublishError::Validation("no page selected for upload".into()))?;

        let video = self.publisher.fetch_clip_bytes(&clip.url).await?;

        let form = Form::new()
            .part(
                "source",
                Part::bytes(video.to_vec())
                    .file_name(format!("{}.mp4", clip.id))
                    .mime_str("video/mp4")?,
            )
            .text("title", metadata.title.clone())
            .text("description", metadata.description.clone())
            .text("access_token", page.access_token.clone());

        let url = format!("{}/{}/videos", self.config.graph_base, page.page_id);
        let response = self.publisher.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let created: CreatedVideo = response.json().await?;
        debug!(video_id = %created.id, page_id = %page.page_id, "Upload complete");
        let watch_url = format!("{}/watch/?v={}", self.config.watch_base, created.id);
        Ok(UploadResult::published(created.id, watch_url))
    }
}
