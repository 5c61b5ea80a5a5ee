//! Publish job state.

use std::collections::HashMap;

use platform_publishers::{Clip, ErrorKind, Platform, PublishError, UploadMetadata};
use uuid::Uuid;

use crate::captions::CaptionSuggestion;

/// Caller-assembled input for a share action: the clip plus editable
/// per-platform metadata.
#[derive(Debug, Clone)]
pub struct PublishJobDraft {
    pub clip: Clip,
    pub metadata: HashMap<Platform, UploadMetadata>,
}

impl PublishJobDraft {
    pub fn new(clip: Clip) -> Self {
        Self {
            clip,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, platform: Platform, metadata: UploadMetadata) -> Self {
        self.metadata.insert(platform, metadata);
        self
    }

    /// Metadata for a platform, falling back to an empty default so a
    /// platform can be shared without caller-edited fields.
    pub fn metadata_for(&self, platform: Platform) -> UploadMetadata {
        self.metadata.get(&platform).cloned().unwrap_or_default()
    }

    /// Apply an accepted caption suggestion identically to every
    /// platform's editable fields. Only called on explicit user accept;
    /// an unaccepted suggestion never touches the draft.
    pub fn accept_suggestion(&mut self, suggestion: &CaptionSuggestion) {
        for platform in Platform::ALL {
            let entry = self.metadata.entry(platform).or_default();
            entry.title = suggestion.title.clone();
            entry.description = suggestion.description.clone();
        }
    }
}

/// Per-platform progress of one share action.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformStatus {
    Pending,
    InFlight,
    Succeeded {
        external_id: String,
        url: String,
        /// A bookkeeping failure after the successful upload. Never
        /// downgrades the status; the upload happened.
        persistence_warning: Option<String>,
    },
    /// Upload accepted, identifier unresolved.
    ResolutionAmbiguous {
        persistence_warning: Option<String>,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl PlatformStatus {
    pub fn failed<M: Into<String>>(kind: ErrorKind, message: M) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(error: &PublishError) -> Self {
        Self::failed(error.kind(), error.to_string())
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::InFlight)
    }

    #[inline]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// The ephemeral, in-memory record of one share action. Discarded once
/// every status is terminal; never persisted.
#[derive(Debug, Clone)]
pub struct PublishJob {
    pub id: Uuid,
    pub clip: Clip,
    pub status: HashMap<Platform, PlatformStatus>,
}

impl PublishJob {
    pub fn is_settled(&self) -> bool {
        self.status.values().all(PlatformStatus::is_terminal)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = Platform> + '_ {
        self.status
            .iter()
            .filter(|(_, status)| status.is_succeeded())
            .map(|(platform, _)| *platform)
    }
}
