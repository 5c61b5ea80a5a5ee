pub mod auth;
pub mod publisher;
pub mod types;

pub use auth::{AuthGrant, AuthorizationFlow};
pub use publisher::default_client;
pub use publisher::error::{ErrorKind, PublishError};
pub use publisher::factory::PublisherFactory;
pub use publisher::platform_publisher::{PlatformPublisher, Publisher, SignIn};
pub use types::{
    Clip, PageSelection, Platform, PlatformCredential, Privacy, Profile, UploadMetadata,
    UploadOutcome, UploadResult,
};
