//! Long-form video host publisher.
//!
//! Upload is a single multipart request: a JSON metadata part plus the
//! video binary. A channel-existence check precedes every upload; an
//! expired credential on that check forces a re-sign-in before anything
//! else is attempted.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::auth::AuthorizationFlow;
use crate::publisher::error::PublishError;
use crate::publisher::platform_publisher::{
    PlatformPublisher, Publisher, SignIn, error_from_response,
};
use crate::types::{Clip, Platform, PlatformCredential, Profile, UploadMetadata, UploadResult};

use super::models::{ChannelListResponse, VideoResource};

/// Message of the distinct "no channel" error that short-circuits an
/// upload before any bytes are sent.
pub const NO_CHANNEL_MESSAGE: &str = "account has no channel to publish to";

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_base: String,
    pub upload_base: String,
    pub watch_base: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/youtube/v3".to_string(),
            watch_base: "https://www.youtube.com".to_string(),
        }
    }
}

pub struct YoutubePublisher {
    publisher: Publisher,
    config: YoutubeConfig,
    auth: Arc<dyn AuthorizationFlow>,
}

impl YoutubePublisher {
    pub fn new(client: Client, auth: Arc<dyn AuthorizationFlow>) -> Self {
        Self::with_config(client, YoutubeConfig::default(), auth)
    }

    pub fn with_config(
        client: Client,
        config: YoutubeConfig,
        auth: Arc<dyn AuthorizationFlow>,
    ) -> Self {
        Self {
            publisher: Publisher::new(Platform::Youtube, client),
            config,
            auth,
        }
    }

    async fn list_channels(&self, token: &str) -> Result<ChannelListResponse, PublishError> {
        let url = format!("{}/channels", self.config.api_base);
        let response = self
            .publisher
            .get(&url)
            .query(&[("part", "snippet"), ("mine", "true")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }

    /// The channel-existence check that must precede every upload. Absence
    /// of a channel is a platform-state error, reported before any upload
    /// bytes move.
    async fn ensure_channel(&self, token: &str) -> Result<(), PublishError> {
        let channels = self.list_channels(token).await?;
        if channels.items.is_empty() {
            return Err(PublishError::platform_api(NO_CHANNEL_MESSAGE, None));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformPublisher for YoutubePublisher {
    fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    async fn sign_in(&self) -> Result<SignIn, PublishError> {
        let grant = self.auth.authorize().await?;
        let credential = PlatformCredential::bearer(grant.access_token);
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
            .bearer_token()
            .ok_or_else(|| PublishError::Validation("credential is not a bearer token".into()))?;

        let channels = self.list_channels(token).await?;
        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::platform_api(NO_CHANNEL_MESSAGE, None))?;

        Ok(Profile {
            display_name: channel.snippet.title,
            avatar_url: channel
                .snippet
                .thumbnails
                .default
                .map(|t| t.url)
                .unwrap_or_default(),
        })
    }

    #[instrument(skip(self, metadata, credential), fields(clip_id = %clip.id))]
    async fn upload(
        &self,
        clip: &Clip,
        metadata: &UploadMetadata,
        credential: &PlatformCredential,
    ) -> Result<UploadResult, PublishError> {
        let mut token = credential
            .bearer_token()
            .ok_or_else(|| PublishError::Auth("missing bearer token".into()))?
            .to_string();
        let mut renewed = None;

        if let Err(err) = self.ensure_channel(&token).await {
            if err.requires_relogin() {
                warn!("Channel check rejected the stored credential; forcing re-sign-in");
                let grant = self.auth.authorize().await?;
                token = grant.access_token.clone();
                renewed = Some(grant);
                // Retry with the fresh credential; the upload below never
                // runs against the stale one.
                self.ensure_channel(&token).await?;
            } else {
                return Err(err);
            }
        }

        let video = self.publisher.fetch_clip_bytes(&clip.url).await?;

        let snippet = serde_json::json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
            },
            "status": {
                "privacyStatus": metadata.privacy.youtube_status(),
            },
        });

        let form = Form::new()
            .part(
                "snippet",
                Part::text(snippet.to_string()).mime_str("application/json")?,
            )
            .part(
                "video",
                Part::bytes(video.to_vec())
                    .file_name(format!("{}.mp4", clip.id))
                    .mime_str("video/mp4")?,
            );

        let url = format!("{}/videos", self.config.upload_base);
        let response = self
            .publisher
            .post(&url)
            .query(&[("uploadType", "multipart"), ("part", "snippet,status")])
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let resource: VideoResource = response.json().await?;
        debug!(video_id = %resource.id, "Upload complete");
        let watch_url = format!("{}/watch?v={}", self.config.watch_base, resource.id);
        Ok(UploadResult::published(resource.id, watch_url).with_renewed(renewed))
    }
}
