//! The auth gateway: login, register and logout.
//!
//! ## Login ordering
//!
//! For one successful login the order is fixed:
//!
//! ```text
//!   response ──→ TokenStore::set ──→ SessionHolder::set ──→ caller resumes
//! ```
//!
//! so anything a subscriber does in reaction to the new session (including
//! firing an authorized request) already sees the new token.

use std::sync::Arc;

use archipel_protocol::{
    ApiMessage, Codec, JsonCodec, JwtResponse, LoginRequest, ProtocolError,
    RegisterRequest, TokenCodec, error_message,
};
use archipel_session::{
    Session, SessionHolder, SessionState, StorageScope, Subscription,
    TokenStore,
};
use archipel_transport::{HttpRequest, HttpTransport};

use crate::{AuthError, Endpoints};

/// Performs the auth calls and keeps token storage and session state in
/// step with their outcome.
///
/// `T` is normally a [`RequestAuthorizer`](crate::RequestAuthorizer), the
/// same path every other call takes.
pub struct AuthGateway<T> {
    transport: T,
    tokens: Arc<TokenStore>,
    session: Arc<SessionHolder>,
    endpoints: Endpoints,
    codec: JsonCodec,
    token_codec: TokenCodec,
}

impl<T: HttpTransport> AuthGateway<T> {
    pub fn new(
        transport: T,
        tokens: Arc<TokenStore>,
        session: Arc<SessionHolder>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            tokens,
            session,
            endpoints,
            codec: JsonCodec,
            token_codec: TokenCodec::default(),
        }
    }

    /// Logs in and returns the server's view of the session.
    ///
    /// # Errors
    /// - [`AuthError::Validation`]: a field is blank; nothing was sent
    /// - [`AuthError::Rejected`]: 401, bad credentials
    /// - [`AuthError::Http`]: any other non-2xx
    /// - [`AuthError::Transport`] / [`AuthError::Protocol`]: no usable answer
    ///
    /// On any error, token storage and session state are left untouched.
    pub async fn login(
        &self,
        credentials: &LoginRequest,
    ) -> Result<Session, AuthError> {
        credentials.validate()?;

        let body = self.codec.encode(credentials)?;
        let request = HttpRequest::post(&self.endpoints.login).with_json(body);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(AuthError::transport)?;

        if !response.is_success() {
            let err = AuthError::from_response(&response);
            tracing::info!(
                status = response.status,
                user = %credentials.username_or_email,
                "login rejected"
            );
            return Err(err);
        }

        let jwt: JwtResponse = self.codec.decode(&response.body)?;
        if jwt.access_token.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "login response has an empty accessToken".into(),
            )
            .into());
        }

        self.tokens.set(&jwt.access_token)?;
        let session = Session::from(jwt);
        self.session.set(Some(session.clone()));

        tracing::info!(
            username = %session.username,
            role = %session.role,
            scope = %self.tokens.scope(),
            "logged in"
        );
        Ok(session)
    }

    /// Registers a new account. Never changes the session: the user still
    /// has to log in afterwards.
    ///
    /// # Errors
    /// - [`AuthError::Validation`]: a field fails a local check
    /// - [`AuthError::Conflict`]: 400/409, username or email taken
    /// - other variants as for [`login`](Self::login)
    pub async fn register(
        &self,
        new_user: &RegisterRequest,
    ) -> Result<ApiMessage, AuthError> {
        new_user.validate()?;

        let body = self.codec.encode(new_user)?;
        let request =
            HttpRequest::post(&self.endpoints.register).with_json(body);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(AuthError::transport)?;

        match response.status {
            200..=299 => {
                // A success with a plain-text (or empty) body is still a success.
                let ack = self.codec.decode(&response.body).unwrap_or_else(
                    |_: ProtocolError| ApiMessage {
                        success: Some(true),
                        message: response.text().trim().to_string(),
                    },
                );
                tracing::info!(username = %new_user.username, "registered");
                Ok(ack)
            }
            400 | 409 => {
                let message = error_message(response.status, &response.body);
                tracing::info!(username = %new_user.username, %message, "registration refused");
                Err(AuthError::Conflict {
                    status: response.status,
                    message,
                })
            }
            _ => Err(AuthError::from_response(&response)),
        }
    }

    /// Forgets the token (in the active scope) and the session.
    ///
    /// Purely local and idempotent. The session is cleared even if the
    /// storage backend fails, in which case the error is returned.
    pub fn logout(&self) -> Result<(), AuthError> {
        let cleared = self.tokens.clear();
        let was = self.session.state();
        self.session.set(None);

        if was.is_authenticated() {
            tracing::info!("logged out");
        }
        cleared.map_err(AuthError::from)
    }

    /// The token in the active scope.
    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    /// `true` when a token is stored in the active scope.
    ///
    /// This is what route guards check. It does not require the token to
    /// decode, and it does not check expiry; the server is the judge.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_present()
    }

    /// The current user: the session holder's value if set, otherwise the
    /// claims of the stored token decoded on the spot.
    pub fn current_user(&self) -> Option<Session> {
        self.session.current().or_else(|| {
            self.tokens
                .get()
                .and_then(|token| Session::from_token(&token, &self.token_codec))
        })
    }

    /// State of the session holder.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Switches token storage scope without migrating the current token.
    pub fn set_storage_scope(&self, scope: StorageScope) {
        self.tokens.set_scope(scope);
    }

    pub fn storage_scope(&self) -> StorageScope {
        self.tokens.scope()
    }

    /// See [`SessionHolder::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        self.session.subscribe(callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.session.unsubscribe(subscription)
    }
}
