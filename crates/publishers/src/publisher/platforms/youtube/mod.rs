mod builder;
pub(crate) mod models;

pub use builder::{NO_CHANNEL_MESSAGE, YoutubeConfig, YoutubePublisher};
