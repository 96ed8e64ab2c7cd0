//! Unified error type for the Archipel client.

use archipel_protocol::{ProtocolError, ValidationError, error_message};
use archipel_session::SessionError;
use archipel_transport::HttpResponse;

use crate::ConfigError;

/// Boxed error from whichever transport the client was built with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapping variant auto-generates `From`
/// impls, so the `?` operator converts sub-crate errors automatically.
///
/// | Variant | Meaning |
/// |---|---|
/// | `Validation` | A local check failed; nothing was sent. |
/// | `Rejected` | 401: bad credentials on login, an expired session elsewhere. |
/// | `Conflict` | 400/409 on register: the identity already exists. |
/// | `Http` | Any other non-2xx answer. |
/// | `Transport` | The server was never reached. |
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server refused the credentials or the session.
    #[error("authentication rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Registration clashed with an existing username or email.
    #[error("{message}")]
    Conflict { status: u16, message: String },

    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    /// Wraps any transport error.
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(error))
    }

    /// Maps a non-2xx response to `Rejected` (401) or `Http` (anything
    /// else), carrying the server's message.
    pub fn from_response(response: &HttpResponse) -> Self {
        let status = response.status;
        let message = error_message(status, &response.body);
        if response.is_unauthorized() {
            Self::Rejected { status, message }
        } else {
            Self::Http { status, message }
        }
    }

    /// The HTTP status behind this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. }
            | Self::Conflict { status, .. }
            | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for a 401 from the server.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
