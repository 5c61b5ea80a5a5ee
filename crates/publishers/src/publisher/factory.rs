use reqwest::Client;
use std::sync::Arc;

use super::platform_publisher::PlatformPublisher;
use super::platforms::facebook::{FacebookConfig, FacebookPublisher};
use super::platforms::tiktok::{TiktokConfig, TiktokPublisher};
use super::platforms::youtube::{YoutubeConfig, YoutubePublisher};
use crate::auth::AuthorizationFlow;
use crate::types::Platform;

/// Per-platform configuration bundle.
#[derive(Debug, Clone, Default)]
pub struct PublisherConfigs {
    pub youtube: YoutubeConfig,
    pub tiktok: TiktokConfig,
    pub facebook: FacebookConfig,
}

/// A factory for creating platform-specific publishers.
pub struct PublisherFactory {
    client: Client,
    configs: PublisherConfigs,
}

impl PublisherFactory {
    pub fn new(client: Client) -> Self {
        Self::with_configs(client, PublisherConfigs::default())
    }

    pub fn with_configs(client: Client, configs: PublisherConfigs) -> Self {
        Self { client, configs }
    }

    pub fn create(
        &self,
        platform: Platform,
        auth: Arc<dyn AuthorizationFlow>,
    ) -> Box<dyn PlatformPublisher> {
        match platform {
            Platform::Youtube => Box::new(YoutubePublisher::with_config(
                self.client.clone(),
                self.configs.youtube.clone(),
                auth,
            )),
            Platform::Tiktok => Box::new(TiktokPublisher::with_config(
                self.client.clone(),
                self.configs.tiktok.clone(),
                auth,
            )),
            Platform::Facebook => Box::new(FacebookPublisher::with_config(
                self.client.clone(),
                self.configs.facebook.clone(),
                auth,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthGrant, AuthorizationFlow};
    use crate::publisher::error::PublishError;
    use async_trait::async_trait;

    struct NoopFlow;

    #[async_trait]
    impl AuthorizationFlow for NoopFlow {
        async fn authorize(&self) -> Result<AuthGrant, PublishError> {
            Ok(AuthGrant::new("test"))
        }
    }

    #[test]
    fn creates_a_publisher_per_platform() {
        let factory = PublisherFactory::new(Client::new());
        for platform in Platform::ALL {
            let publisher = factory.create(platform, Arc::new(NoopFlow));
            assert_eq!(publisher.platform(), platform);
        }
    }
}
