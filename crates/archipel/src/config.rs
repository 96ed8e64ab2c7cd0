//! Client configuration.
//!
//! Every field has a default matching the development backend, so an
//! empty JSON object (`{}`) is a valid configuration. Field names are
//! camelCase in JSON.

use std::path::PathBuf;

use archipel_session::{DEFAULT_TOKEN_KEY, StorageScope};
use serde::{Deserialize, Serialize};

/// Errors from loading or checking a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Paths relative to [`ClientConfig::api_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    /// Declared by the backend, not called: logout is purely local.
    pub logout: String,
    /// Declared by the backend, not called: there is no refresh flow yet.
    pub refresh: String,
    pub profile: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            register: "/auth/register".into(),
            logout: "/auth/logout".into(),
            refresh: "/auth/refresh".into(),
            profile: "/users/me".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration for an [`AuthClient`](crate::AuthClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL every endpoint path is resolved against.
    pub api_url: String,

    /// Storage key for the bearer token.
    pub token_key: String,

    /// Scope the token is stored in at start-up.
    pub storage: StorageScope,

    /// File backing the persistent scope. `None` keeps it in memory,
    /// which makes "persistent" last only as long as the process.
    pub storage_path: Option<PathBuf>,

    /// Nominal token lifetime in milliseconds. Informational: the client
    /// never checks expiry, the server does.
    pub expiration_ms: u64,

    /// Where to send the user when the session is gone.
    pub login_route: String,

    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".into(),
            token_key: DEFAULT_TOKEN_KEY.into(),
            storage: StorageScope::Persistent,
            storage_path: None,
            expiration_ms: 3_600_000,
            login_route: "/auth/login".into(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the fields that would otherwise fail on first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "apiUrl must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        if self.token_key.trim().is_empty() {
            return Err(ConfigError::Invalid("tokenKey must not be empty".into()));
        }
        if !self.login_route.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "loginRoute must start with '/', got {:?}",
                self.login_route
            )));
        }

        let endpoints = [
            ("login", &self.endpoints.login),
            ("register", &self.endpoints.register),
            ("logout", &self.endpoints.logout),
            ("refresh", &self.endpoints.refresh),
            ("profile", &self.endpoints.profile),
        ];
        for (name, path) in endpoints {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "endpoints.{name} must start with '/', got {path:?}"
                )));
            }
        }
        Ok(())
    }
}
