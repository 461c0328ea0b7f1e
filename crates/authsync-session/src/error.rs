//! Error types for the session layer.

/// Errors that can occur while reading or writing the persisted mirror.
///
/// The reducer itself never fails. It logs these and carries on, because
/// a storage hiccup must not stop a login from taking effect in memory.
/// They surface as `Err` only from direct storage calls and from
/// [`PersistedSession::load`](crate::PersistedSession::load).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The storage backend refused the operation (quota exceeded, storage
    /// disabled, poisoned lock...).
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// A file-backed store couldn't be read or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value couldn't be serialized or parsed back.
    #[error("persisted value is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
