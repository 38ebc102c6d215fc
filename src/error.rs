//! Error types for the session store.

/// Errors surfaced by the session store.
///
/// Storage failures are fatal for the save (or purge) phase that hit them and
/// are never retried here. Decode failures are only ever seen by callers of a
/// [`Serializer`](crate::Serializer) directly; the open phase recovers from
/// them by starting a fresh session.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The database rejected a query, or a commit failed.
    #[error("session backend error: {0}")]
    Backend(String),

    /// Session contents could not be serialized.
    #[error("session encode error: {0}")]
    Encode(String),

    /// A stored payload could not be deserialized.
    #[error("session decode error: {0}")]
    Decode(String),

    /// A configuration value was missing or malformed.
    #[error("session configuration error: {0}")]
    Config(String),
}

impl From<sea_orm::DbErr> for Error {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
