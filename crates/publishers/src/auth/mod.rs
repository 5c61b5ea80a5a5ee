//! Out-of-band authorization flows.
//!
//! Sign-in never happens inline: the user completes it on an external
//! surface (popup, redirect, or a platform SDK). Two flow shapes cover
//! the supported platforms:
//!
//! - [`relay::RelayFlow`]: a one-shot, origin-checked message relay; the
//!   surface posts a single grant (or error) back to the waiting flow.
//! - [`CallbackFlow`]: a platform SDK exposes a login call that invokes a
//!   callback with either a grant or a failure reason.

mod relay;

pub use relay::{AuthMessage, AuthPayload, AuthRelay, AuthorizationSurface, RelayFlow, RelaySender};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::publisher::error::PublishError;

/// An access grant produced by a completed authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthGrant {
    pub fn new<T: Into<String>>(access_token: T) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }
}

/// A complete authorization round: drive the external surface, resolve to
/// exactly one grant or one failure.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    async fn authorize(&self) -> Result<AuthGrant, PublishError>;
}

/// Callback invoked by a platform SDK login entry point.
pub type LoginCallback = Box<dyn FnOnce(Result<AuthGrant, String>) + Send>;

/// A platform-provided login surface that reports through a callback.
pub trait SdkLogin: Send + Sync {
    fn login(&self, callback: LoginCallback);
}

/// Adapts an [`SdkLogin`] onto the async flow contract via a oneshot
/// channel. A dropped callback counts as a cancelled sign-in.
pub struct CallbackFlow<S> {
    sdk: S,
}

impl<S: SdkLogin> CallbackFlow<S> {
    pub fn new(sdk: S) -> Self {
        Self { sdk }
    }
}

#[async_trait]
impl<S: SdkLogin> AuthorizationFlow for CallbackFlow<S> {
    async fn authorize(&self) -> Result<AuthGrant, PublishError> {
        let (tx, rx) = oneshot::channel();
        self.sdk.login(Box::new(move |result| {
            let _ = tx.send(result);
        }));

        match rx.await {
            Ok(Ok(grant)) => Ok(grant),
            Ok(Err(reason)) => Err(PublishError::Auth(reason)),
            Err(_) => Err(PublishError::Auth(
                "login surface closed without reporting a result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ImmediateSdk {
        result: Result<AuthGrant, String>,
    }

    impl SdkLogin for ImmediateSdk {
        fn login(&self, callback: LoginCallback) {
            callback(self.result.clone());
        }
    }

    /// An SDK that never invokes the callback, dropping it instead.
    struct SilentSdk;

    impl SdkLogin for SilentSdk {
        fn login(&self, callback: LoginCallback) {
            drop(callback);
        }
    }

    #[tokio::test]
    async fn callback_flow_resolves_grant() {
        let flow = CallbackFlow::new(ImmediateSdk {
            result: Ok(AuthGrant::new("token-1")),
        });
        let grant = flow.authorize().await.unwrap();
        assert_eq!(grant.access_token, "token-1");
    }

    #[tokio::test]
    async fn callback_flow_surfaces_sdk_failure() {
        let flow = CallbackFlow::new(ImmediateSdk {
            result: Err("user denied consent".to_string()),
        });
        let err = flow.authorize().await.unwrap_err();
        assert!(matches!(err, PublishError::Auth(reason) if reason.contains("denied")));
    }

    #[tokio::test]
    async fn dropped_callback_is_cancellation() {
        let flow = CallbackFlow::new(SilentSdk);
        let err = flow.authorize().await.unwrap_err();
        assert!(err.requires_relogin());
    }
}
