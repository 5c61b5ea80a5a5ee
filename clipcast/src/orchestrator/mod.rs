//! Publish orchestration.
//!
//! Drives single-platform publishes and the concurrent quick share.
//! Platform failures are isolated: every eligible platform's upload is
//! dispatched independently and every settlement, success or failure,
//! lands in the job's status map. No platform branching happens here; the
//! protocol differences live behind the publisher trait.

pub mod job;

pub use job::{PlatformStatus, PublishJob, PublishJobDraft};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use platform_publishers::{
    Clip, ErrorKind, Platform, PlatformCredential, UploadMetadata, UploadOutcome,
};

use crate::PublisherMap;
use crate::credentials::CredentialService;
use crate::records::{ExternalId, PublishRecord, PublishRecordWriter};

pub struct PublishOrchestrator {
    credentials: Arc<CredentialService>,
    publishers: Arc<PublisherMap>,
    records: Arc<dyn PublishRecordWriter>,
}

impl PublishOrchestrator {
    pub fn new(
        credentials: Arc<CredentialService>,
        publishers: Arc<PublisherMap>,
        records: Arc<dyn PublishRecordWriter>,
    ) -> Self {
        Self {
            credentials,
            publishers,
            records,
        }
    }

    /// Publish the clip to one platform.
    ///
    /// Pre-flight validation runs against stored state only; a failure
    /// there settles the status with zero publisher calls.
    #[instrument(skip(self, draft), fields(clip_id = %draft.clip.id))]
    pub async fn share_one(&self, platform: Platform, draft: &PublishJobDraft) -> PlatformStatus {
        let credential = match self.preflight(platform).await {
            Ok(credential) => credential,
            Err(status) => return status,
        };

        self.publish_to(platform, &draft.clip, &draft.metadata_for(platform), credential)
            .await
    }

    /// Publish the clip to every eligible platform at once.
    ///
    /// Eligible = authenticated session whose platform preconditions hold;
    /// ineligible platforms are absent from the returned status map.
    /// Uploads run concurrently with settle-all semantics: one platform's
    /// failure never cancels, delays, or hides another's result.
    #[instrument(skip(self, draft), fields(clip_id = %draft.clip.id))]
    pub async fn quick_share_all(&self, draft: &PublishJobDraft) -> PublishJob {
        let mut eligible = Vec::new();
        for platform in Platform::ALL {
            match self.preflight(platform).await {
                Ok(credential) => eligible.push((platform, credential)),
                Err(status) => {
                    debug!(%platform, ?status, "Skipping ineligible platform");
                }
            }
        }

        let statuses: Arc<Mutex<HashMap<Platform, PlatformStatus>>> = Arc::new(Mutex::new(
            eligible
                .iter()
                .map(|(platform, _)| (*platform, PlatformStatus::Pending))
                .collect(),
        ));

        let uploads = eligible.into_iter().map(|(platform, credential)| {
            let statuses = Arc::clone(&statuses);
            let clip = draft.clip.clone();
            let metadata = draft.metadata_for(platform);
            async move {
                statuses.lock().insert(platform, PlatformStatus::InFlight);
                let status = self
                    .publish_to(platform, &clip, &metadata, credential)
                    .await;
                // Recorded as soon as this platform settles; siblings may
                // still be in flight.
                statuses.lock().insert(platform, status);
            }
        });
        join_all(uploads).await;

        let status = statuses.lock().clone();
        PublishJob {
            id: Uuid::new_v4(),
            clip: draft.clip.clone(),
            status,
        }
    }

    /// Stored-state-only eligibility check. Never touches the network.
    async fn preflight(&self, platform: Platform) -> Result<PlatformCredential, PlatformStatus> {
        let session = match self.credentials.session(platform).await {
            Ok(session) => session,
            Err(e) => return Err(PlatformStatus::from_error(&e)),
        };

        if !session.is_authenticated() {
            return Err(PlatformStatus::failed(
                ErrorKind::Auth,
                format!("{platform} session is not signed in"),
            ));
        }
        let Some(credential) = session.credential else {
            return Err(PlatformStatus::failed(
                ErrorKind::Auth,
                format!("{platform} session is not signed in"),
            ));
        };

        if matches!(
            credential,
            PlatformCredential::PageAccount {
                selected_page: None,
                ..
            }
        ) {
            return Err(PlatformStatus::failed(
                ErrorKind::Validation,
                "no page selected for upload",
            ));
        }

        Ok(credential)
    }

    /// Upload to one platform and record the outcome.
    ///
    /// The credential was captured at pre-flight; a session cleared while
    /// the upload is in flight does not cancel it; the call finishes with
    /// the credential it started with.
    async fn publish_to(
        &self,
        platform: Platform,
        clip: &Clip,
        metadata: &UploadMetadata,
        credential: PlatformCredential,
    ) -> PlatformStatus {
        let Some(publisher) = self.publishers.get(&platform) else {
            return PlatformStatus::failed(
                ErrorKind::Validation,
                format!("no publisher registered for {platform}"),
            );
        };

        match publisher.upload(clip, metadata, &credential).await {
            Ok(result) => {
                if let Some(grant) = result.renewed {
                    if let Err(e) = self.credentials.adopt_renewed(platform, grant).await {
                        warn!(%platform, error = %e, "Failed to persist renewed credential");
                    }
                }

                let (external_id, url) = match &result.outcome {
                    UploadOutcome::Published { external_id, url } => (
                        ExternalId::Resolved(external_id.clone()),
                        Some(url.clone()),
                    ),
                    UploadOutcome::AcceptedUnresolved => (ExternalId::Unresolved, None),
                };
                let record = PublishRecord {
                    clip_id: clip.id.clone(),
                    platform,
                    external_id,
                    url,
                    metadata: metadata.clone(),
                    published_at: Utc::now(),
                };

                // Bookkeeping runs before the status turns terminal; its
                // failure is a warning, never a downgrade.
                let persistence_warning = match self.records.save(&record).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(%platform, error = %e, "Publish record persistence failed");
                        Some(e.to_string())
                    }
                };

                match result.outcome {
                    UploadOutcome::Published { external_id, url } => PlatformStatus::Succeeded {
                        external_id,
                        url,
                        persistence_warning,
                    },
                    UploadOutcome::AcceptedUnresolved => PlatformStatus::ResolutionAmbiguous {
                        persistence_warning,
                    },
                }
            }
            Err(e) => {
                if e.requires_relogin() {
                    // The one permitted session mutation on the upload
                    // path: clear on a 401-equivalent.
                    if let Err(clear_err) = self.credentials.sign_out(platform).await {
                        warn!(%platform, error = %clear_err, "Failed to clear rejected session");
                    }
                }
                PlatformStatus::from_error(&e)
            }
        }
    }
}
