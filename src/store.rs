//! The persistence contract the session lifecycle runs against.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::Result;

/// A persisted session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Internal primary key. Minted once when the record is inserted.
    pub record_id: String,
    /// Public identifier, equal to the cookie value.
    pub session_id: String,
    /// Absolute expiry, recomputed on every save.
    pub expires_at: OffsetDateTime,
    /// Serialized session contents.
    pub data: String,
    /// Owning user, maintained outside the session lifecycle.
    pub user_id: Option<String>,
}

impl SessionRecord {
    /// Whether the record is no longer valid at `now`. A record whose expiry
    /// equals `now` counts as expired.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Storage backend consulted by the [`SessionInterface`](crate::SessionInterface).
///
/// Implementations are scoped to a single unit of work (typically one
/// request). Writes issued through `insert`, `update` and `delete` only need
/// to become durable and visible to other units of work once `commit`
/// returns.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Finds the record whose public identifier is `session_id`, expired or
    /// not.
    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    async fn insert(&self, record: &SessionRecord) -> Result<()>;

    /// Overwrites `data` and `expires_at` of the record with the same
    /// `record_id`. Other columns are left alone.
    async fn update(&self, record: &SessionRecord) -> Result<()>;

    async fn delete(&self, record: &SessionRecord) -> Result<()>;

    async fn commit(&self) -> Result<()>;
}
