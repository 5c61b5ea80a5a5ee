//! One-shot message relay for popup-style sign-in.
//!
//! The authorization surface (a child window in the original product, any
//! external process here) posts a single message carrying the grant or an
//! error. The relay awaits the first message whose origin matches the
//! expected one; messages from other origins are ignored without consuming
//! the wait. When every sender is gone before a valid message arrives, the
//! surface was closed and the sign-in counts as cancelled. The receiver is
//! consumed by the wait, never a persistent subscription.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

use super::{AuthGrant, AuthorizationFlow};
use crate::publisher::error::PublishError;

/// Buffer for messages posted before the relay is polled. Anything past
/// this is hostile chatter and may be dropped.
const RELAY_CAPACITY: usize = 8;

/// Payload of a relayed authorization message.
#[derive(Debug, Clone)]
pub enum AuthPayload {
    Grant(AuthGrant),
    Error(String),
}

/// A message posted by the authorization surface.
#[derive(Debug, Clone)]
pub struct AuthMessage {
    pub origin: String,
    pub payload: AuthPayload,
}

impl AuthMessage {
    pub fn grant<O: Into<String>>(origin: O, grant: AuthGrant) -> Self {
        Self {
            origin: origin.into(),
            payload: AuthPayload::Grant(grant),
        }
    }

    pub fn error<O: Into<String>, E: Into<String>>(origin: O, error: E) -> Self {
        Self {
            origin: origin.into(),
            payload: AuthPayload::Error(error.into()),
        }
    }
}

/// Sender half handed to the authorization surface.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<AuthMessage>,
}

impl RelaySender {
    /// Post a message to the waiting relay. Returns `false` when the relay
    /// is gone or saturated; the surface has nothing useful to do with the
    /// failure, so it is not an error.
    pub fn post(&self, message: AuthMessage) -> bool {
        self.tx.try_send(message).is_ok()
    }
}

/// Receiver half: awaits exactly one validated message.
pub struct AuthRelay {
    expected_origin: String,
    rx: mpsc::Receiver<AuthMessage>,
}

impl AuthRelay {
    /// Create a relay that only accepts messages from `expected_origin`.
    pub fn channel<O: Into<String>>(expected_origin: O) -> (RelaySender, AuthRelay) {
        let (tx, rx) = mpsc::channel(RELAY_CAPACITY);
        (
            RelaySender { tx },
            AuthRelay {
                expected_origin: expected_origin.into(),
                rx,
            },
        )
    }

    /// Await the first origin-valid message. Consumes the relay; the
    /// channel is torn down when this returns.
    pub async fn await_grant(mut self) -> Result<AuthGrant, PublishError> {
        while let Some(message) = self.rx.recv().await {
            if !origin_matches(&self.expected_origin, &message.origin) {
                warn!(
                    origin = %message.origin,
                    expected = %self.expected_origin,
                    "Ignoring authorization message from unexpected origin"
                );
                continue;
            }

            return match message.payload {
                AuthPayload::Grant(grant) => {
                    debug!(origin = %message.origin, "Authorization grant received");
                    Ok(grant)
                }
                AuthPayload::Error(reason) => Err(PublishError::Auth(reason)),
            };
        }

        // All senders dropped: the surface closed without posting.
        Err(PublishError::Auth(
            "authorization surface closed before a grant was posted".to_string(),
        ))
    }
}

/// Compare two origins as URL origins (scheme + host + port), falling back
/// to literal comparison for values that do not parse as URLs.
fn origin_matches(expected: &str, got: &str) -> bool {
    match (Url::parse(expected), Url::parse(got)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => expected == got,
    }
}

/// Opens the external authorization surface and hands it the sender half.
pub trait AuthorizationSurface: Send + Sync {
    fn open(&self, sender: RelaySender);
}

/// Message-relay sign-in flow: open the surface, await one grant.
pub struct RelayFlow<S> {
    expected_origin: String,
    surface: S,
}

impl<S: AuthorizationSurface> RelayFlow<S> {
    pub fn new<O: Into<String>>(expected_origin: O, surface: S) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            surface,
        }
    }
}

#[async_trait]
impl<S: AuthorizationSurface> AuthorizationFlow for RelayFlow<S> {
    async fn authorize(&self) -> Result<AuthGrant, PublishError> {
        let (sender, relay) = AuthRelay::channel(self.expected_origin.clone());
        self.surface.open(sender);
        relay.await_grant().await
    }
}
