//! # Archipel
//!
//! Client-side JWT session management for the Archipel Libre API.
//!
//! Archipel keeps one bearer token and one "current user" per process,
//! attaches the token to every request, and logs the user out as soon as
//! the server answers 401. Applications build a single [`AuthClient`] and
//! share it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archipel::prelude::*;
//!
//! # async fn run() -> Result<(), AuthError> {
//! let client = AuthClient::connect(ClientConfig::default())?;
//!
//! client.subscribe(|user| match user {
//!     Some(u) => println!("hello {}", u.username),
//!     None => println!("signed out"),
//! });
//!
//! client.login(&LoginRequest::new("testuser", "password123")).await?;
//! assert!(client.can_activate("/dashboard").is_allowed());
//! # Ok(())
//! # }
//! ```

mod authorizer;
mod client;
mod config;
mod error;
mod gateway;
mod guard;

pub use authorizer::{LogNavigator, Navigator, RequestAuthorizer};
pub use client::{AuthClient, AuthClientBuilder};
pub use config::{ClientConfig, ConfigError, Endpoints};
pub use error::{AuthError, BoxError};
pub use gateway::AuthGateway;
pub use guard::{AuthGuard, GuardDecision};

pub use archipel_protocol::{
    ApiMessage, Claims, JwtResponse, LoginRequest, RegisterRequest,
    TokenCodec, ValidationError,
};
pub use archipel_session::{
    FileStore, KeyValueStore, MemoryStore, Session, SessionHolder,
    SessionState, StorageScope, Subscription, TokenStore,
};
pub use archipel_transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport,
};

/// Everything an application needs in one import.
pub mod prelude {
    pub use crate::{
        ApiMessage, AuthClient, AuthError, ClientConfig, GuardDecision,
        LoginRequest, Navigator, RegisterRequest, Session, SessionState,
        StorageScope,
    };
}
