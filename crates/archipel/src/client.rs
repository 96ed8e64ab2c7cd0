//! `AuthClient` builder and the authorized request helpers.
//!
//! This is the entry point for applications. It wires the layers together
//! once, at start-up:
//!
//! ```text
//!   ClientConfig ──→ TokenStore ──→ SessionHolder (seeded from stored token)
//!                        │               │
//!                        ▼               ▼
//!   transport ──→ RequestAuthorizer ──→ AuthGateway / get_json / ...
//!                        │
//!                        └──→ AuthGuard
//! ```
//!
//! Every call, auth endpoints included, goes through the same
//! [`RequestAuthorizer`].

use std::sync::Arc;

use archipel_protocol::{
    ApiMessage, Codec, JsonCodec, LoginRequest, RegisterRequest, TokenCodec,
};
use archipel_session::{
    FileStore, MemoryStore, Session, SessionHolder, SessionState,
    StorageScope, Subscription, TokenStore,
};
use archipel_transport::{
    HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    AuthError, AuthGateway, AuthGuard, ClientConfig, GuardDecision,
    LogNavigator, Navigator, RequestAuthorizer,
};

/// Builder for an [`AuthClient`].
///
/// # Example
///
/// ```rust,no_run
/// use archipel::prelude::*;
///
/// # async fn run() -> Result<(), AuthError> {
/// let client = AuthClient::builder(ClientConfig::default())
///     .navigator(|route: &str| println!("go to {route}"))
///     .connect()?;
///
/// client.login(&LoginRequest::new("testuser", "password123")).await?;
/// let me: serde_json::Value = client.profile().await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthClientBuilder {
    config: ClientConfig,
    navigator: Arc<dyn Navigator>,
    tokens: Option<Arc<TokenStore>>,
}

impl AuthClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            navigator: Arc::new(LogNavigator),
            tokens: None,
        }
    }

    /// Sets who gets told to show the login page. Defaults to
    /// [`LogNavigator`].
    pub fn navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    /// Uses `tokens` instead of building a store from the config.
    pub fn token_store(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Builds a client over `transport`.
    ///
    /// # Errors
    /// Returns `AuthError::Config` if the configuration is invalid.
    pub fn build<T: HttpTransport>(
        self,
        transport: T,
    ) -> Result<AuthClient<T>, AuthError> {
        self.config.validate()?;
        let config = self.config;

        let tokens = match self.tokens {
            Some(tokens) => tokens,
            None => Arc::new(token_store_for(&config)),
        };
        let session = Arc::new(SessionHolder::from_store(
            &tokens,
            &TokenCodec::<JsonCodec>::default(),
        ));

        let http = Arc::new(
            RequestAuthorizer::new(
                transport,
                Arc::clone(&tokens),
                Arc::clone(&session),
                Arc::clone(&self.navigator),
                config.login_route.clone(),
            )
            .exempt(config.endpoints.login.clone())
            .exempt(config.endpoints.register.clone()),
        );

        let gateway = AuthGateway::new(
            Arc::clone(&http),
            Arc::clone(&tokens),
            Arc::clone(&session),
            config.endpoints.clone(),
        );
        let guard = AuthGuard::new(
            Arc::clone(&tokens),
            self.navigator,
            config.login_route.clone(),
        );

        tracing::debug!(
            api_url = %config.api_url,
            scope = %tokens.scope(),
            state = ?session.state(),
            "auth client ready"
        );

        Ok(AuthClient {
            config,
            http,
            gateway,
            guard,
        })
    }

    /// Builds a client over a [`ReqwestTransport`] for `config.api_url`.
    pub fn connect(self) -> Result<AuthClient<ReqwestTransport>, AuthError> {
        let transport = ReqwestTransport::new(&self.config.api_url)
            .map_err(AuthError::transport)?;
        self.build(transport)
    }
}

/// A token store laid out the way `config` asks: the session scope in
/// memory, the persistent scope in `storage_path` if one is set.
fn token_store_for(config: &ClientConfig) -> TokenStore {
    match &config.storage_path {
        Some(path) => TokenStore::new(
            config.token_key.clone(),
            config.storage,
            MemoryStore::new(),
            FileStore::new(path),
        ),
        None => TokenStore::in_memory(config.token_key.clone(), config.storage),
    }
}

/// The assembled client: auth operations, session state, route guarding
/// and authorized requests.
pub struct AuthClient<T> {
    config: ClientConfig,
    http: Arc<RequestAuthorizer<T>>,
    gateway: AuthGateway<Arc<RequestAuthorizer<T>>>,
    guard: AuthGuard,
}

impl AuthClient<ReqwestTransport> {
    /// Creates a new builder.
    pub fn builder(config: ClientConfig) -> AuthClientBuilder {
        AuthClientBuilder::new(config)
    }

    /// Shorthand for `AuthClient::builder(config).connect()`.
    pub fn connect(config: ClientConfig) -> Result<Self, AuthError> {
        AuthClientBuilder::new(config).connect()
    }
}

impl<T: HttpTransport> AuthClient<T> {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The authorizing transport, for callers that want raw responses.
    pub fn http(&self) -> &Arc<RequestAuthorizer<T>> {
        &self.http
    }

    pub fn gateway(&self) -> &AuthGateway<Arc<RequestAuthorizer<T>>> {
        &self.gateway
    }

    pub fn guard(&self) -> &AuthGuard {
        &self.guard
    }

    // -- Auth ---------------------------------------------------------------

    pub async fn login(
        &self,
        credentials: &LoginRequest,
    ) -> Result<Session, AuthError> {
        self.gateway.login(credentials).await
    }

    pub async fn register(
        &self,
        new_user: &RegisterRequest,
    ) -> Result<ApiMessage, AuthError> {
        self.gateway.register(new_user).await
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.gateway.logout()
    }

    pub fn token(&self) -> Option<String> {
        self.gateway.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.gateway.is_authenticated()
    }

    pub fn current_user(&self) -> Option<Session> {
        self.gateway.current_user()
    }

    pub fn state(&self) -> SessionState {
        self.gateway.state()
    }

    pub fn set_storage_scope(&self, scope: StorageScope) {
        self.gateway.set_storage_scope(scope);
    }

    pub fn storage_scope(&self) -> StorageScope {
        self.gateway.storage_scope()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        self.gateway.subscribe(callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.gateway.unsubscribe(subscription)
    }

    pub fn can_activate(&self, url: &str) -> GuardDecision {
        self.guard.can_activate(url)
    }

    // -- Authorized requests -------------------------------------------------

    /// Sends `request` through the authorizer and returns the response
    /// whatever its status.
    pub async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, AuthError> {
        self.http.send(request).await.map_err(AuthError::transport)
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, AuthError> {
        self.call(HttpRequest::get(path)).await
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AuthError> {
        let body = JsonCodec.encode(body)?;
        self.call(HttpRequest::post(path).with_json(body)).await
    }

    pub async fn put_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AuthError> {
        let body = JsonCodec.encode(body)?;
        self.call(HttpRequest::put(path).with_json(body)).await
    }

    /// Sends a DELETE. Any 2xx is success; the body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), AuthError> {
        self.checked(HttpRequest::delete(path)).await.map(drop)
    }

    /// The logged-in user's profile from the profile endpoint.
    ///
    /// Returned as raw JSON: its shape belongs to the user service, not
    /// to this crate.
    pub async fn profile(&self) -> Result<serde_json::Value, AuthError> {
        self.get_json(&self.config.endpoints.profile).await
    }

    async fn checked(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, AuthError> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(AuthError::from_response(&response));
        }
        Ok(response)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<R, AuthError> {
        let response = self.checked(request).await?;
        Ok(JsonCodec.decode(&response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use archipel_transport::TransportError;

    use super::*;

    struct Offline;

    impl HttpTransport for Offline {
        type Error = TransportError;

        async fn send(&self, _: HttpRequest) -> Result<HttpResponse, Self::Error> {
            Err(TransportError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_build_invalid_config_is_config_error() {
        let config = ClientConfig {
            api_url: "localhost".into(),
            ..ClientConfig::default()
        };

        let result = AuthClientBuilder::new(config).build(Offline);

        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_build_uses_configured_scope_and_key() {
        let config = ClientConfig {
            storage: StorageScope::Session,
            token_key: "my_token".into(),
            ..ClientConfig::default()
        };

        let client = AuthClientBuilder::new(config).build(Offline).unwrap();

        assert_eq!(client.storage_scope(), StorageScope::Session);
        assert_eq!(client.state(), SessionState::Anonymous);
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_build_with_storage_path_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            storage_path: Some(dir.path().join("session.json")),
            ..ClientConfig::default()
        };

        let first = AuthClientBuilder::new(config.clone()).build(Offline).unwrap();
        assert!(!first.is_authenticated());
        token_store_for(&config).set("persisted").unwrap();

        let reopened = AuthClientBuilder::new(config).build(Offline).unwrap();

        assert_eq!(reopened.token().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_send_transport_failure_is_transport_error() {
        let client = AuthClientBuilder::new(ClientConfig::default())
            .build(Offline)
            .unwrap();

        let err = client.get_json::<serde_json::Value>("/users/me").await.unwrap_err();

        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[test]
    fn test_connect_builds_reqwest_client() {
        let client = AuthClient::connect(ClientConfig::default()).unwrap();
        assert_eq!(client.http().inner().base_url(), "http://localhost:8080/api");
    }
}
