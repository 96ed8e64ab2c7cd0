//! Session types: the data structures that describe who is logged in.
//!
//! A "session" is the client's record of the authenticated user. It tracks:
//! - WHO the user is (`username`, `email`)
//! - WHAT they may do (`role`, a hint for the UI only)
//! - HOW to prove it (`access_token`, sent as a bearer credential)

use std::fmt;

use archipel_protocol::{
    Claims, Codec, JwtResponse, TOKEN_TYPE_BEARER, TokenCodec,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The current user, as returned by the login endpoint or recovered from a
/// stored token.
///
/// `Debug` only shows the first few characters of the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl Session {
    /// Builds a session from decoded claims and the token they came from.
    pub fn from_claims(token: &str, claims: Claims) -> Self {
        Self {
            access_token: token.to_string(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            username: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }

    /// Decodes `token` into a session, or `None` if it doesn't decode.
    pub fn from_token<C: Codec>(
        token: &str,
        codec: &TokenCodec<C>,
    ) -> Option<Self> {
        codec
            .decode(token)
            .map(|claims| Self::from_claims(token, claims))
    }

    /// Case-insensitive role check (`"admin"` matches `"ADMIN"`).
    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }
}

/// The login response IS the session; no re-decoding of the token.
impl From<JwtResponse> for Session {
    fn from(resp: JwtResponse) -> Self {
        Self {
            access_token: resp.access_token,
            token_type: resp.token_type,
            username: resp.username,
            email: resp.email,
            role: resp.role,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.access_token.chars().take(6).collect();
        f.debug_struct("Session")
            .field("access_token", &format_args!("{prefix}…"))
            .field("token_type", &self.token_type)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether anyone is logged in.
///
/// ```text
///                 login / decodable stored token
///   Anonymous ────────────────────────────────────→ Authenticated
///       ↑                                               │
///       └──────────── logout / any intercepted 401 ─────┘
/// ```
///
/// There is no Authenticated → Authenticated edge: a 401 always goes
/// through Anonymous before the next login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl SessionState {
    /// Derives the state from the current session value.
    pub fn of(session: Option<&Session>) -> Self {
        match session {
            Some(_) => Self::Authenticated,
            None => Self::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}
