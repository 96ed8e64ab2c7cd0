//! Bearer token payload decoding.
//!
//! A token looks like `header.payload.signature`, each segment base64url
//! encoded. [`TokenCodec`] reads the claims out of the payload segment so
//! the client can show who is logged in and which role they hold.
//!
//! This is NOT verification. The signature segment is ignored entirely,
//! and nothing here should be used to make a trust decision. The server
//! checks the signature on every request; the client only needs the claims
//! for display and for hiding UI that the server would refuse anyway.
//!
//! Tokens come from storage and from the network, so decoding fails soft:
//! any malformed input yields `None`, never a panic or an error.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_ROLE;
use crate::{Codec, JsonCodec};

/// Claims read from a token's payload segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Empty when the token carries no `email` claim.
    pub email: String,
    /// [`DEFAULT_ROLE`] when the token carries no `role` claim.
    pub role: String,
    /// Issued-at, seconds since the epoch. Carried, never checked.
    pub iat: Option<i64>,
    /// Expiry, seconds since the epoch. Carried, never checked.
    pub exp: Option<i64>,
}

/// The payload as it appears on the wire. Every field is optional (and
/// nullable) so that defaults are applied in one place.
#[derive(Deserialize)]
struct RawClaims {
    sub: Option<String>,
    email: Option<String>,
    role: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
}

/// Decodes a token's payload segment into [`Claims`].
#[derive(Debug, Clone, Default)]
pub struct TokenCodec<C: Codec = JsonCodec> {
    codec: C,
}

impl<C: Codec> TokenCodec<C> {
    /// Creates a token codec that parses the payload with `codec`.
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Decodes the claims of `token`, or returns `None` if the token is
    /// not `header.payload[.signature]`, the payload is not base64, the
    /// JSON does not parse, or the subject is missing.
    pub fn decode(&self, token: &str) -> Option<Claims> {
        let Some(payload) = token.split('.').nth(1) else {
            tracing::debug!("token has no payload segment");
            return None;
        };

        let bytes = match decode_segment(payload) {
            Some(bytes) => bytes,
            None => {
                tracing::debug!("token payload is not valid base64");
                return None;
            }
        };

        let raw: RawClaims = match self.codec.decode(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "token payload is not valid JSON");
                return None;
            }
        };

        let sub = raw.sub.filter(|s| !s.is_empty());
        let Some(sub) = sub else {
            tracing::debug!("token payload has no subject");
            return None;
        };

        Some(Claims {
            sub,
            email: raw.email.unwrap_or_default(),
            role: raw.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            iat: raw.iat,
            exp: raw.exp,
        })
    }
}

/// Base64url is what the JWT convention prescribes, but some servers emit
/// the standard alphabet. Padding is optional in both.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    if trimmed.is_empty() {
        return None;
    }
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()
}
