//! Per-platform session state and its lifecycle.
//!
//! A session is the one piece of mutable shared state in the system. The
//! store is keyed by platform, persists to SQLite, and publishes a change
//! event on every write so other holders of the store re-validate instead
//! of trusting cached state. Writes are last-writer-wins; there is no
//! cross-holder locking.

pub mod service;
pub mod store;
pub mod types;

pub use service::CredentialService;
pub use store::{SessionEventBroadcaster, SessionStore, SqlxSessionStore};
pub use types::{Session, SessionChange, SessionEvent};
