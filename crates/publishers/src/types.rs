//! Core publishing types shared by the platform implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::AuthGrant;

/// Supported publishing platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Tiktok,
    Facebook,
}

impl Platform {
    /// All supported platforms, in display order.
    pub const ALL: [Platform; 3] = [Platform::Youtube, Platform::Tiktok, Platform::Facebook];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished clip handed over by the editing side: an identifier plus a
/// playable, already-hosted URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub url: String,
}

impl Clip {
    pub fn new<I: Into<String>, U: Into<String>>(id: I, url: U) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Visibility of the published video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Privacy {
    /// YouTube `status.privacyStatus` value.
    pub fn youtube_status(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        }
    }

    /// TikTok `privacy_level` value. TikTok has no unlisted tier; the
    /// closest match is follower-only visibility.
    pub fn tiktok_level(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC_TO_EVERYONE",
            Self::Unlisted => "FOLLOWER_OF_CREATOR",
            Self::Private => "SELF_ONLY",
        }
    }
}

/// Editable per-platform upload metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub privacy: Privacy,
}

impl UploadMetadata {
    pub fn new<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            privacy: Privacy::default(),
        }
    }
}

/// Display identity of the signed-in account, used purely for UI
/// confirmation, never for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub avatar_url: String,
}

/// One of the pages available to a page-host account. Exactly one is
/// selected at a time; selection is required before a page upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSelection {
    pub page_id: String,
    pub page_name: String,
    pub access_token: String,
}

/// The credential a platform session holds: an opaque bearer token, or a
/// page account whose upload authority lives in the selected page's token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformCredential {
    BearerToken { token: String },
    PageAccount {
        user_token: String,
        selected_page: Option<PageSelection>,
    },
}

impl PlatformCredential {
    pub fn bearer<T: Into<String>>(token: T) -> Self {
        Self::BearerToken {
            token: token.into(),
        }
    }

    /// The bearer token, if this credential is token-shaped.
    pub fn bearer_token(&self) -> Option<&str> {
        match self {
            Self::BearerToken { token } => Some(token),
            Self::PageAccount { .. } => None,
        }
    }

    /// The user-level token of a page account.
    pub fn user_token(&self) -> Option<&str> {
        match self {
            Self::BearerToken { .. } => None,
            Self::PageAccount { user_token, .. } => Some(user_token),
        }
    }

    pub fn selected_page(&self) -> Option<&PageSelection> {
        match self {
            Self::PageAccount {
                selected_page: Some(page),
                ..
            } => Some(page),
            _ => None,
        }
    }

    /// A credential with no usable secret is treated as absent.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::BearerToken { token } => token.is_empty(),
            Self::PageAccount { user_token, .. } => user_token.is_empty(),
        }
    }
}

/// What an upload settled as, before bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The platform returned (or resolution discovered) the published
    /// video's identifier and canonical URL.
    Published { external_id: String, url: String },
    /// The platform accepted the upload but the identifier could not be
    /// confirmed. Never reported as a plain success with a blank URL.
    AcceptedUnresolved,
}

/// Result of a platform upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub outcome: UploadOutcome,
    /// Set when the publisher was forced through a re-sign-in mid-upload;
    /// the caller is expected to persist the fresh grant.
    pub renewed: Option<AuthGrant>,
}

impl UploadResult {
    pub fn published<I: Into<String>, U: Into<String>>(external_id: I, url: U) -> Self {
        Self {
            outcome: UploadOutcome::Published {
                external_id: external_id.into(),
                url: url.into(),
            },
            renewed: None,
        }
    }

    pub fn accepted_unresolved() -> Self {
        Self {
            outcome: UploadOutcome::AcceptedUnresolved,
            renewed: None,
        }
    }

    pub fn with_renewed(mut self, grant: Option<AuthGrant>) -> Self {
        self.renewed = grant;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privacy_maps_to_platform_values() {
        assert_eq!(Privacy::Public.youtube_status(), "public");
        assert_eq!(Privacy::Unlisted.youtube_status(), "unlisted");
        assert_eq!(Privacy::Public.tiktok_level(), "PUBLIC_TO_EVERYONE");
        assert_eq!(Privacy::Private.tiktok_level(), "SELF_ONLY");
    }

    #[test]
    fn credential_accessors() {
        let token = PlatformCredential::bearer("abc");
        assert_eq!(token.bearer_token(), Some("abc"));
        assert!(token.selected_page().is_none());
        assert!(!token.is_empty());

        let page_account = PlatformCredential::PageAccount {
            user_token: "user".to_string(),
            selected_page: Some(PageSelection {
                page_id: "42".to_string(),
                page_name: "My Page".to_string(),
                access_token: "page-token".to_string(),
            }),
        };
        assert!(page_account.bearer_token().is_none());
        assert_eq!(page_account.selected_page().unwrap().page_id, "42");
    }

    #[test]
    fn empty_bearer_token_is_empty() {
        assert!(PlatformCredential::bearer("").is_empty());
    }

    #[test]
    fn platform_serializes_snake_case() {
        let json = serde_json::to_string(&Platform::Youtube).unwrap();
        assert_eq!(json, "\"youtube\"");
    }
}
