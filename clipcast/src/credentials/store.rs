//! Session persistence and change notification.
//!
//! The SQL implementation is a small keyed store: one row per platform,
//! replaced wholesale on every write. Clearing rewrites credential and
//! profile together in a single statement, so a reader can never observe a
//! half-cleared session.

use async_trait::async_trait;
use chrono::DateTime;
use platform_publishers::Platform;
use sqlx::Row;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::database::DbPool;

use super::types::{Session, SessionChange, SessionEvent};

/// Default channel capacity for session events.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for session change events.
///
/// Uses tokio's broadcast channel to distribute events to multiple
/// subscribers; publishing with no subscribers is fine.
pub struct SessionEventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning the number of receivers that saw it.
    pub fn publish(&self, event: SessionEvent) -> usize {
        debug!(provider = %event.provider, change = ?event.change, "Publishing session event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SessionEventBroadcaster {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Keyed session persistence with change notification.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, provider: Platform) -> crate::Result<Session>;

    /// Persist the session. Last writer wins: concurrent writers race and
    /// the later write silently overwrites the earlier one.
    async fn save(&self, session: &Session, change: SessionChange) -> crate::Result<()>;

    /// Reset credential and profile together, atomically.
    async fn clear(&self, provider: Platform) -> crate::Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// SQLx-backed session store.
pub struct SqlxSessionStore {
    pool: DbPool,
    events: SessionEventBroadcaster,
}

impl SqlxSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            events: SessionEventBroadcaster::new(),
        }
    }
}

#[async_trait]
impl SessionStore for SqlxSessionStore {
    #[instrument(skip(self))]
    async fn load(&self, provider: Platform) -> crate::Result<Session> {
        let row = sqlx::query(
            r#"
            SELECT credential, profile, validated_at
            FROM sessions
            WHERE provider = ?
            "#,
        )
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(Session::signed_out(provider));
        };

        let credential = row
            .get::<Option<String>, _>("credential")
            .map(|s| serde_json::from_str(&s))
            .transpose()?;
        let profile = row
            .get::<Option<String>, _>("profile")
            .map(|s| serde_json::from_str(&s))
            .transpose()?;
        let validated_at = row
            .get::<Option<i64>, _>("validated_at")
            .and_then(DateTime::from_timestamp_millis);

        Ok(Session {
            provider,
            credential,
            profile,
            validated_at,
        })
    }

    #[instrument(skip(self, session), fields(provider = %session.provider))]
    async fn save(&self, session: &Session, change: SessionChange) -> crate::Result<()> {
        let credential = session
            .credential
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let profile = session
            .profile
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let validated_at = session.validated_at.map(|t| t.timestamp_millis());

        sqlx::query(
            r#"
            INSERT INTO sessions (provider, credential, profile, validated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(provider) DO UPDATE SET
                credential = excluded.credential,
                profile = excluded.profile,
                validated_at = excluded.validated_at
            "#,
        )
        .bind(session.provider.as_str())
        .bind(credential)
        .bind(profile)
        .bind(validated_at)
        .execute(&self.pool)
        .await?;

        self.events.publish(SessionEvent {
            provider: session.provider,
            change,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, provider: Platform) -> crate::Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET credential = NULL, profile = NULL, validated_at = NULL
            WHERE provider = ?
            "#,
        )
        .bind(provider.as_str())
        .execute(&self.pool)
        .await?;

        self.events.publish(SessionEvent {
            provider,
            change: SessionChange::Cleared,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_publishers::{PlatformCredential, Profile};
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn memory_store() -> SqlxSessionStore {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        crate::database::run_migrations(&pool).await.unwrap();
        SqlxSessionStore::new(pool)
    }

    fn sample_session(token: &str) -> Session {
        Session::established(
            Platform::Youtube,
            PlatformCredential::bearer(token),
            Profile {
                display_name: "Chan".to_string(),
                avatar_url: "https://a/b.png".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn load_of_unknown_provider_is_signed_out() {
        let store = memory_store().await;
        let session = store.load(Platform::Tiktok).await.unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let store = memory_store().await;
        let session = sample_session("tok");
        store.save(&session, SessionChange::Updated).await.unwrap();

        let loaded = store.load(Platform::Youtube).await.unwrap();
        assert!(loaded.is_authenticated());
        assert_eq!(loaded.credential, session.credential);
        assert_eq!(loaded.profile, session.profile);
    }

    #[tokio::test]
    async fn clear_resets_credential_and_profile_together() {
        let store = memory_store().await;
        store
            .save(&sample_session("tok"), SessionChange::Updated)
            .await
            .unwrap();

        store.clear(Platform::Youtube).await.unwrap();

        let loaded = store.load(Platform::Youtube).await.unwrap();
        assert!(!loaded.is_authenticated());
        assert!(loaded.credential.is_none());
        assert!(loaded.profile.is_none());
        assert!(loaded.validated_at.is_none());
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let store = memory_store().await;
        store
            .save(&sample_session("first"), SessionChange::Updated)
            .await
            .unwrap();
        store
            .save(&sample_session("second"), SessionChange::Updated)
            .await
            .unwrap();

        let loaded = store.load(Platform::Youtube).await.unwrap();
        assert_eq!(
            loaded.credential,
            Some(PlatformCredential::bearer("second"))
        );
    }

    #[tokio::test]
    async fn writes_publish_events_to_all_subscribers() {
        let store = memory_store().await;
        let mut rx1 = store.subscribe();
        let mut rx2 = store.subscribe();

        store
            .save(&sample_session("tok"), SessionChange::Updated)
            .await
            .unwrap();
        store.clear(Platform::Youtube).await.unwrap();

        for rx in [&mut rx1, &mut rx2] {
            let first = rx.recv().await.unwrap();
            assert_eq!(first.change, SessionChange::Updated);
            let second = rx.recv().await.unwrap();
            assert_eq!(second.change, SessionChange::Cleared);
            assert_eq!(second.provider, Platform::Youtube);
        }
    }

    #[test]
    fn broadcaster_without_subscribers_does_not_panic() {
        let broadcaster = SessionEventBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        let delivered = broadcaster.publish(SessionEvent {
            provider: Platform::Facebook,
            change: SessionChange::Updated,
        });
        assert_eq!(delivered, 0);

        let _rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
    }
}
