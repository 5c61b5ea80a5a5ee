use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a platform publisher can settle with.
///
/// Every failure crossing the publisher boundary is converted to one of
/// these kinds before it reaches the orchestration layer.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Missing, expired, or cancelled authorization. Triggers the
    /// re-sign-in flow rather than a silent failure.
    #[error("authorization required: {0}")]
    Auth(String),
    /// A required selection or input is missing. No network call was made.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The platform returned a structured error body; the message is
    /// surfaced verbatim where possible.
    #[error("platform error: {message}")]
    PlatformApi {
        message: String,
        status: Option<u16>,
    },
    /// The upload was accepted but the published video's identifier could
    /// not be confirmed.
    #[error("upload accepted but the published video could not be resolved")]
    ResolutionAmbiguous,
    /// The upload succeeded; only the bookkeeping did not.
    #[error("publish record persistence failed: {0}")]
    Persistence(String),
}

/// Discriminant of [`PublishError`], used in per-platform status maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Validation,
    Network,
    PlatformApi,
    ResolutionAmbiguous,
    Persistence,
}

impl PublishError {
    pub fn platform_api<M: Into<String>>(message: M, status: Option<u16>) -> Self {
        Self::PlatformApi {
            message: message.into(),
            status,
        }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Network,
            Self::PlatformApi { .. } => ErrorKind::PlatformApi,
            Self::ResolutionAmbiguous => ErrorKind::ResolutionAmbiguous,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Check if this error means the stored session is unusable and the
    /// user must sign in again.
    #[inline]
    pub fn requires_relogin(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this error is transient and the operation may be retried
    /// with the same credential.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::PlatformApi { status, .. } => matches!(status, Some(s) if *s >= 500),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        Self::PlatformApi {
            message: format!("unexpected response body: {err}"),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_requires_relogin() {
        assert!(PublishError::Auth("expired".into()).requires_relogin());
        assert!(!PublishError::Validation("no page".into()).requires_relogin());
        assert!(!PublishError::ResolutionAmbiguous.requires_relogin());
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(PublishError::platform_api("boom", Some(503)).is_transient());
        assert!(!PublishError::platform_api("bad request", Some(400)).is_transient());
        assert!(!PublishError::Auth("expired".into()).is_transient());
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            PublishError::Persistence("db down".into()).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            PublishError::ResolutionAmbiguous.kind(),
            ErrorKind::ResolutionAmbiguous
        );
    }
}
