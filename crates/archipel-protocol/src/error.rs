//! Error types for the protocol layer.
//!
//! Each crate in Archipel defines its own error enum. This keeps errors
//! specific and meaningful: when you see a `ProtocolError`, you know
//! the problem is in serialization/deserialization, not in networking
//! or session storage.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: the server answered with HTML instead of JSON,
    /// a required field is missing, or the body is truncated.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but makes no sense, e.g. a login response
    /// with an empty access token.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
