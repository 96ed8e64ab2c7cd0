//! Error types for the session layer.

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) backend.
///
/// A missing key is never an error; these only cover backends that
/// cannot be read or written at all.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing file could not be read, written or created.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not hold a JSON string map.
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}
