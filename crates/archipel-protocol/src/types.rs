//! Request and response bodies exchanged with the auth endpoints.
//!
//! Field names follow the backend's camelCase JSON (`usernameOrEmail`,
//! `accessToken`, ...); `#[serde(rename_all = "camelCase")]` maps them onto
//! snake_case Rust fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role assumed when neither the server nor the token names one.
pub const DEFAULT_ROLE: &str = "USER";

/// Token type assumed when the login response leaves it out.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

fn default_token_type() -> String {
    TOKEN_TYPE_BEARER.to_string()
}

// ---------------------------------------------------------------------------
// LoginRequest
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
///
/// `Debug` is written by hand so the password never ends up in a log line.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Either the username or the email address; the server accepts both.
    pub username_or_email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(
        username_or_email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username_or_email", &self.username_or_email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RegisterRequest
// ---------------------------------------------------------------------------

/// Body of `POST /auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// JwtResponse
// ---------------------------------------------------------------------------

/// Successful body of `POST /auth/login`.
///
/// ```json
/// {"accessToken":"eyJ...","tokenType":"Bearer","username":"testuser",
///  "email":"test@example.com","role":"USER"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

// ---------------------------------------------------------------------------
// ApiMessage
// ---------------------------------------------------------------------------

/// Generic `{success, message}` body: the register acknowledgement and
/// the shape of most error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
}

/// Extracts a human-readable message from an error response.
///
/// Tries a JSON `{"message": ...}` body first, then the raw body as text,
/// and finally falls back to the status code's reason phrase.
pub fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(msg) = serde_json::from_slice::<ApiMessage>(body) {
        if !msg.message.trim().is_empty() {
            return msg.message;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    // A JSON body without a message is not worth echoing back.
    if !text.is_empty() && !text.starts_with('{') {
        return text.to_string();
    }

    reason_phrase(status).to_string()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unexpected response",
    }
}
