//! Short-form video host publisher.
//!
//! Publishing is two-phase: a pull-from-URL submission that the platform
//! acknowledges with a flag only, then a resolution poll of the account's
//! most-recent-video listing to discover the assigned identifier. The poll
//! is bounded; an exhausted poll reports the upload as accepted but
//! unresolved, never as a success with a blank URL.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::auth::AuthorizationFlow;
use crate::publisher::error::PublishError;
use crate::publisher::platform_publisher::{
    PlatformPublisher, Publisher, SignIn, error_from_response,
};
use crate::types::{Clip, Platform, PlatformCredential, Profile, UploadMetadata, UploadResult};

use super::models::{SubmitResponse, UserInfoResponse, VideoListResponse, VideoSummary};

#[derive(Debug, Clone)]
pub struct TiktokConfig {
    pub api_base: String,
    pub share_base: String,
    pub disable_duet: bool,
    pub disable_comment: bool,
    pub disable_stitch: bool,
    pub video_cover_timestamp_ms: u64,
    pub is_aigc: bool,
    /// Resolution poll attempts. The platform's ingestion latency is
    /// unspecified, so the poll stays bounded and best-effort.
    pub resolve_attempts: u32,
    /// Delay before the second poll attempt; doubles per attempt.
    pub resolve_initial_delay: Duration,
}

impl Default for TiktokConfig {
    fn default() -> Self {
        Self {
            api_base: "https://open.tiktokapis.com".to_string(),
            share_base: "https://www.tiktok.com".to_string(),
            disable_duet: false,
            disable_comment: false,
            disable_stitch: false,
            video_cover_timestamp_ms: 1000,
            is_aigc: false,
            resolve_attempts: 3,
            resolve_initial_delay: Duration::from_millis(500),
        }
    }
}

pub struct TiktokPublisher {
    publisher: Publisher,
    config: TiktokConfig,
    auth: Arc<dyn AuthorizationFlow>,
}

impl TiktokPublisher {
    pub fn new(client: Client, auth: Arc<dyn AuthorizationFlow>) -> Self {
        Self::with_config(client, TiktokConfig::default(), auth)
    }

    pub fn with_config(
        client: Client,
        config: TiktokConfig,
        auth: Arc<dyn AuthorizationFlow>,
    ) -> Self {
        Self {
            publisher: Publisher::new(Platform::Tiktok, client),
            config,
            auth,
        }
    }

    /// Top-1, most-recent entry of the account's video listing.
    async fn latest_video(&self, token: &str) -> Result<Option<VideoSummary>, PublishError> {
        let url = format!("{}/v2/video/list/", self.config.api_base);
        let response = self
            .publisher
            .get(&url)
            .query(&[
                ("fields", "id,create_time,title,description,share_url"),
                ("max_count", "1"),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let listing: VideoListResponse = response.json().await?;
        Ok(listing.data.videos.into_iter().next())
    }
}

#[async_trait]
impl PlatformPublisher for TiktokPublisher {
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

        let url = format!("{}/v2/user/info/", self.config.api_base);
        let response = self
            .publisher
            .get(&url)
            .query(&[("fields", "display_name,avatar_url")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let info: UserInfoResponse = response.json().await?;
        Ok(Profile {
            display_name: info.data.user.display_name,
            avatar_url: info.data.user.avatar_url,
        })
    }

    #[instrument(skip(self, metadata, credential), fields(clip_id = %clip.id))]
    async fn upload(
        &self,
        clip: &Clip,
        metadata: &UploadMetadata,
        credential: &PlatformCredential,
    ) -> Result<UploadResult, PublishError> {
        let token = credential
            .bearer_token()
            .ok_or_else(|| PublishError::Auth("missing bearer token".into()))?;

        let fields = [
            ("source_type", "PULL_FROM_URL".to_string()),
            ("publish_type", "DIRECT_POST".to_string()),
            ("title", metadata.title.clone()),
            ("privacy_level", metadata.privacy.tiktok_level().to_string()),
            ("disable_duet", self.config.disable_duet.to_string()),
            ("disable_comment", self.config.disable_comment.to_string()),
            ("disable_stitch", self.config.disable_stitch.to_string()),
            (
                "video_cover_timestamp_ms",
                self.config.video_cover_timestamp_ms.to_string(),
            ),
            ("is_aigc", self.config.is_aigc.to_string()),
            ("video_url", clip.url.clone()),
        ];

        let url = format!("{}/v2/post/publish/video/init/", self.config.api_base);
        let response = self
            .publisher
            .post(&url)
            .bearer_auth(token)
            .form(&fields)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let submission: SubmitResponse = response.json().await?;
        if !submission.success {
            return Err(PublishError::platform_api(
                submission
                    .message
                    .unwrap_or_else(|| "upload submission rejected".to_string()),
                None,
            ));
        }

        // The platform assigned no identifier synchronously; poll the
        // listing until it shows up or the bounded retries run dry. A
        // failed poll never revokes the acceptance above.
        let mut delay = self.config.resolve_initial_delay;
        for attempt in 0..self.config.resolve_attempts {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }

            match self.latest_video(token).await {
                Ok(Some(video)) => {
                    debug!(video_id = %video.id, attempt, "Resolved published video");
                    let url = video
                        .share_url
                        .unwrap_or_else(|| format!("{}/video/{}", self.config.share_base, video.id));
                    return Ok(UploadResult::published(video.id, url));
                }
                Ok(None) => {
                    debug!(attempt, "Video listing still empty");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Resolution poll failed");
                }
            }
        }

        warn!(
            attempts = self.config.resolve_attempts,
            "Upload accepted but identifier unresolved"
        );
        Ok(UploadResult::accepted_unresolved())
    }
}
