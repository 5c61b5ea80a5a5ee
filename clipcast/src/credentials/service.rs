//! Session lifecycle service.
//!
//! Wraps the store with the platform-facing operations: sign-in, the
//! probe-on-load validation, page selection, and reaction to external
//! change events.

use std::sync::Arc;

use chrono::Utc;
use platform_publishers::auth::AuthGrant;
use platform_publishers::{PageSelection, Platform, PlatformCredential, PublishError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::PublisherMap;

use super::store::SessionStore;
use super::types::{Session, SessionChange, SessionEvent};

/// Store failures surface as persistence errors: the platform itself was
/// never reached.
fn persist_err(e: crate::Error) -> PublishError {
    PublishError::Persistence(e.to_string())
}

pub struct CredentialService {
    store: Arc<dyn SessionStore>,
    publishers: Arc<PublisherMap>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn SessionStore>, publishers: Arc<PublisherMap>) -> Self {
        Self { store, publishers }
    }

    fn publisher_for(
        &self,
        provider: Platform,
    ) -> Result<&Arc<dyn platform_publishers::PlatformPublisher>, PublishError> {
        self.publishers.get(&provider).ok_or_else(|| {
            PublishError::Validation(format!("no publisher registered for {provider}"))
        })
    }

    /// The stored session, as-is. No network traffic.
    pub async fn session(&self, provider: Platform) -> Result<Session, PublishError> {
        self.store.load(provider).await.map_err(persist_err)
    }

    /// The stored session, validated against the platform.
    ///
    /// When a credential exists, the platform's lightweight "who am I"
    /// probe runs before the session is declared valid. A probe that
    /// rejects the credential clears the session (credential and profile
    /// together) and reports the auth error upward; a transient probe
    /// failure leaves the stored state alone.
    #[instrument(skip(self))]
    pub async fn validated_session(&self, provider: Platform) -> Result<Session, PublishError> {
        let session = self.session(provider).await?;
        let Some(credential) = session.credential.clone() else {
            return Ok(session);
        };

        let publisher = self.publisher_for(provider)?;
        match publisher.fetch_profile(&credential).await {
            Ok(profile) => {
                let refreshed = Session {
                    provider,
                    credential: Some(credential),
                    profile: Some(profile),
                    validated_at: Some(Utc::now()),
                };
                self.store
                    .save(&refreshed, SessionChange::Revalidated)
                    .await
                    .map_err(persist_err)?;
                Ok(refreshed)
            }
            Err(e) if e.requires_relogin() => {
                warn!(%provider, error = %e, "Session failed validation probe; clearing");
                self.store.clear(provider).await.map_err(persist_err)?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Drive the platform's sign-in flow and persist the resulting session.
    #[instrument(skip(self))]
    pub async fn sign_in(&self, provider: Platform) -> Result<Session, PublishError> {
        let publisher = self.publisher_for(provider)?;
        let signed_in = publisher.sign_in().await?;
        info!(%provider, display_name = %signed_in.profile.display_name, "Signed in");

        let session = Session::established(provider, signed_in.credential, signed_in.profile);
        self.store
            .save(&session, SessionChange::Updated)
            .await
            .map_err(persist_err)?;
        Ok(session)
    }

    pub async fn sign_out(&self, provider: Platform) -> Result<(), PublishError> {
        self.store.clear(provider).await.map_err(persist_err)
    }

    /// Select the page a page-host upload publishes to.
    #[instrument(skip(self, page), fields(page_id = %page.page_id))]
    pub async fn select_page(&self, page: PageSelection) -> Result<Session, PublishError> {
        let session = self.session(Platform::Facebook).await?;
        let Some(PlatformCredential::PageAccount { user_token, .. }) = session.credential else {
            return Err(PublishError::Validation(
                "page host session is not signed in".to_string(),
            ));
        };

        let updated = Session {
            provider: Platform::Facebook,
            credential: Some(PlatformCredential::PageAccount {
                user_token,
                selected_page: Some(page),
            }),
            profile: session.profile,
            validated_at: session.validated_at,
        };
        self.store
            .save(&updated, SessionChange::Updated)
            .await
            .map_err(persist_err)?;
        Ok(updated)
    }

    /// Persist a grant produced by a forced mid-upload re-sign-in.
    pub async fn adopt_renewed(
        &self,
        provider: Platform,
        grant: AuthGrant,
    ) -> Result<(), PublishError> {
        let session = self.session(provider).await?;
        let credential = match session.credential {
            Some(PlatformCredential::PageAccount { selected_page, .. }) => {
                PlatformCredential::PageAccount {
                    user_token: grant.access_token,
                    selected_page,
                }
            }
            _ => PlatformCredential::bearer(grant.access_token),
        };

        let renewed = Session {
            provider,
            credential: Some(credential),
            profile: session.profile,
            validated_at: Some(Utc::now()),
        };
        self.store
            .save(&renewed, SessionChange::Updated)
            .await
            .map_err(persist_err)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.subscribe()
    }

    /// React to external session writes by re-validating the touched
    /// provider instead of trusting cached state.
    pub fn start_revalidation_task(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        let mut events = service.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Session revalidation task shutting down");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(SessionEvent { change: SessionChange::Revalidated, .. }) => {
                            // Our own probe writes; re-probing would loop.
                        }
                        Ok(SessionEvent { provider, .. }) => {
                            if let Err(e) = service.validated_session(provider).await {
                                debug!(%provider, error = %e, "Re-validation after session change failed");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "Session event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        })
    }
}
