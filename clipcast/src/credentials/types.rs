//! Core session types.

use chrono::{DateTime, Utc};
use platform_publishers::{Platform, PlatformCredential, Profile};
use serde::{Deserialize, Serialize};

/// A platform's authentication state plus its credential.
///
/// There is no stored `is_authenticated` flag: authentication is derived
/// from the credential, so a session can never claim to be signed in while
/// holding an empty credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub provider: Platform,
    pub credential: Option<PlatformCredential>,
    pub profile: Option<Profile>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session with nothing in it.
    pub fn signed_out(provider: Platform) -> Self {
        Self {
            provider,
            credential: None,
            profile: None,
            validated_at: None,
        }
    }

    /// A freshly established session.
    pub fn established(
        provider: Platform,
        credential: PlatformCredential,
        profile: Profile,
    ) -> Self {
        Self {
            provider,
            credential: Some(credential),
            profile: Some(profile),
            validated_at: Some(Utc::now()),
        }
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// What kind of write produced a [`SessionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// Credential or profile content changed (sign-in, page selection).
    Updated,
    /// The session was cleared (sign-out or failed validation).
    Cleared,
    /// A validation probe confirmed the session and refreshed its
    /// `validated_at`. Listeners must not re-probe on this, or every probe
    /// would trigger the next.
    Revalidated,
}

/// Broadcast on every store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub provider: Platform,
    pub change: SessionChange,
}
