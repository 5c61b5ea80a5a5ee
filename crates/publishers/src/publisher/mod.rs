pub mod error;
pub mod factory;
pub mod platform_publisher;
pub mod platforms;
mod default;

pub use default::{DEFAULT_UA, default_client};
