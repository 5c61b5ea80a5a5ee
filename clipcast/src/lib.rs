//! clipcast library crate.
//!
//! Multi-platform clip publish orchestration: per-platform session
//! lifecycle, the concurrent quick share, and durable publish records.
//! The platform protocols themselves live in the `platform-publishers`
//! crate.

use std::collections::HashMap;
use std::sync::Arc;

use platform_publishers::{Platform, PlatformPublisher};

pub mod captions;
pub mod config;
pub mod credentials;
pub mod database;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod records;

pub use error::{Error, Result};

/// Publishers keyed by platform, shared by the credential service and the
/// orchestrator.
pub type PublisherMap = HashMap<Platform, Arc<dyn PlatformPublisher>>;
