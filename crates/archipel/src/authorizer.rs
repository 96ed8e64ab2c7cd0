//! Request authorizer: attaches the bearer token, reacts to 401.
//!
//! [`RequestAuthorizer`] wraps any [`HttpTransport`] and is itself an
//! `HttpTransport`, so it composes like any other layer:
//!
//! ```text
//!   caller ──→ RequestAuthorizer ──→ inner transport ──→ server
//!              │ before: Authorization: Bearer <token>
//!              │ after:  401 → clear token, clear session, navigate
//!              └ response (any status) returned unchanged
//! ```
//!
//! The 401 is never retried or swallowed: the caller still receives the
//! original response and decides how to report it.

use std::sync::Arc;

use archipel_session::{SessionHolder, TokenStore};
use archipel_transport::{HttpRequest, HttpResponse, HttpTransport};

/// Receives navigation requests, e.g. "go to the login page".
///
/// Any `Fn(&str)` closure is a navigator.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn navigate(&self, route: &str) {
        self(route)
    }
}

/// A navigator for headless use: it only logs the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "navigation requested");
    }
}

/// Decorates a transport with bearer-token handling and implicit logout.
pub struct RequestAuthorizer<T> {
    inner: T,
    tokens: Arc<TokenStore>,
    session: Arc<SessionHolder>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    /// Paths whose 401 means "bad credentials", not "session expired".
    exempt: Vec<String>,
}

impl<T: HttpTransport> RequestAuthorizer<T> {
    pub fn new(
        inner: T,
        tokens: Arc<TokenStore>,
        session: Arc<SessionHolder>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            tokens,
            session,
            navigator,
            login_route: login_route.into(),
            exempt: Vec::new(),
        }
    }

    /// Exempts `path` from implicit logout. The token is still attached.
    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.exempt.push(path.into());
        self
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn is_exempt(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.exempt.iter().any(|p| p == path)
    }

    /// Sets `Authorization: Bearer <token>` when a token is stored,
    /// replacing any header the caller set. Returns the token it attached.
    fn authorize(&self, request: &mut HttpRequest) -> Option<String> {
        let token = self.tokens.get()?;
        request.set_header("authorization", format!("Bearer {token}"));
        Some(token)
    }

    /// Session expired on the server: drop everything and send the user to
    /// the login page.
    ///
    /// Skipped when the stored token is no longer the one the rejected
    /// request carried: a newer login must survive a stale 401.
    fn implicit_logout(&self, attached: Option<&str>) {
        if self.tokens.get().as_deref() != attached {
            tracing::debug!("401 for a replaced token, session kept");
            return;
        }
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "failed to clear token after 401");
        }
        self.session.set(None);
        tracing::info!(route = %self.login_route, "session rejected by server, logged out");
        self.navigator.navigate(&self.login_route);
    }
}

impl<T: HttpTransport> HttpTransport for RequestAuthorizer<T> {
    type Error = T::Error;

    async fn send(
        &self,
        mut request: HttpRequest,
    ) -> Result<HttpResponse, Self::Error> {
        let exempt = self.is_exempt(&request.path);
        let attached = self.authorize(&mut request);
        let method = request.method;
        let path = request.path.clone();

        let response = self.inner.send(request).await?;

        if response.is_unauthorized() && !exempt {
            tracing::debug!(%method, %path, "401 on authorized request");
            self.implicit_logout(attached.as_deref());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for `RequestAuthorizer`, driven by an in-process fake
    //! transport that records every request and replies with a fixed status.

    use std::sync::Mutex;

    use archipel_protocol::JwtResponse;
    use archipel_session::{DEFAULT_TOKEN_KEY, Session, StorageScope};
    use archipel_transport::TransportError;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    struct FixedStatus {
        status: u16,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl FixedStatus {
        fn new(status: u16) -> Self {
            Self {
                status,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    impl HttpTransport for FixedStatus {
        type Error = TransportError;

        async fn send(
            &self,
            request: HttpRequest,
        ) -> Result<HttpResponse, Self::Error> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(self.status, "body"))
        }
    }

    struct Unreachable;

    impl HttpTransport for Unreachable {
        type Error = TransportError;

        async fn send(&self, _: HttpRequest) -> Result<HttpResponse, Self::Error> {
            Err(TransportError::Unavailable("connection refused".into()))
        }
    }

    /// Stores a new token while the request is in flight, then answers 401,
    /// like a login that lands before an older request is rejected.
    #[derive(Default)]
    struct SwapThenReject {
        swap_to: Mutex<Option<Arc<TokenStore>>>,
    }

    impl HttpTransport for SwapThenReject {
        type Error = TransportError;

        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error> {
            assert_eq!(request.header("authorization"), Some("Bearer token-a"));
            if let Some(tokens) = self.swap_to.lock().unwrap().as_ref() {
                tokens.set("token-b").unwrap();
            }
            Ok(HttpResponse::new(401, "Unauthorized"))
        }
    }

    struct Fixture<T> {
        authorizer: RequestAuthorizer<T>,
        tokens: Arc<TokenStore>,
        session: Arc<SessionHolder>,
        navigations: Arc<Mutex<Vec<String>>>,
    }

    fn fixture<T: HttpTransport>(inner: T, token: Option<&str>) -> Fixture<T> {
        let tokens = Arc::new(TokenStore::in_memory(
            DEFAULT_TOKEN_KEY,
            StorageScope::Persistent,
        ));
        let session = Arc::new(SessionHolder::default());
        if let Some(token) = token {
            tokens.set(token).unwrap();
            session.set(Some(Session::from(JwtResponse {
                access_token: token.into(),
                token_type: "Bearer".into(),
                username: "testuser".into(),
                email: "t@example.com".into(),
                role: "USER".into(),
            })));
        }
        let navigations = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&navigations);
        let navigator: Arc<dyn Navigator> = Arc::new(move |route: &str| {
            sink.lock().unwrap().push(route.to_string());
        });
        let authorizer = RequestAuthorizer::new(
            inner,
            Arc::clone(&tokens),
            Arc::clone(&session),
            navigator,
            "/auth/login",
        )
        .exempt("/auth/login");

        Fixture {
            authorizer,
            tokens,
            session,
            navigations,
        }
    }

    // =====================================================================
    // before send
    // =====================================================================

    #[tokio::test]
    async fn test_send_with_token_attaches_bearer_header() {
        let f = fixture(FixedStatus::new(200), Some("tok1"));

        f.authorizer.send(HttpRequest::get("/users/me")).await.unwrap();

        let sent = f.authorizer.inner().last_request();
        assert_eq!(sent.header("Authorization"), Some("Bearer tok1"));
    }

    #[tokio::test]
    async fn test_send_without_token_leaves_request_unmodified() {
        let f = fixture(FixedStatus::new(200), None);
        let request = HttpRequest::get("/events").with_header("Accept", "application/json");

        f.authorizer.send(request.clone()).await.unwrap();

        assert_eq!(f.authorizer.inner().last_request(), request);
    }

    #[tokio::test]
    async fn test_send_replaces_caller_authorization_header() {
        let f = fixture(FixedStatus::new(200), Some("tok1"));
        let request = HttpRequest::get("/x").with_header("Authorization", "Bearer stale");

        f.authorizer.send(request).await.unwrap();

        let sent = f.authorizer.inner().last_request();
        assert_eq!(sent.header("authorization"), Some("Bearer tok1"));
    }

    // =====================================================================
    // after receive
    // =====================================================================

    #[tokio::test]
    async fn test_401_clears_session_and_navigates_once() {
        let f = fixture(FixedStatus::new(401), Some("tok1"));

        let response = f.authorizer.send(HttpRequest::get("/protected")).await.unwrap();

        // The original 401 still reaches the caller.
        assert_eq!(response.status, 401);
        assert_eq!(f.tokens.get(), None);
        assert!(f.session.current().is_none());
        assert_eq!(*f.navigations.lock().unwrap(), vec!["/auth/login".to_string()]);
    }

    #[tokio::test]
    async fn test_401_on_exempt_path_does_not_log_out() {
        let f = fixture(FixedStatus::new(401), Some("tok1"));

        let response = f
            .authorizer
            .send(HttpRequest::post("/auth/login?next=1"))
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(f.tokens.get().as_deref(), Some("tok1"));
        assert!(f.session.current().is_some());
        assert!(f.navigations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_error_statuses_pass_through() {
        for status in [400, 403, 404, 500, 503] {
            let f = fixture(FixedStatus::new(status), Some("tok1"));

            let response = f.authorizer.send(HttpRequest::get("/x")).await.unwrap();

            assert_eq!(response.status, status);
            assert_eq!(f.tokens.get().as_deref(), Some("tok1"), "status {status}");
            assert!(f.navigations.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_stale_401_does_not_clear_newer_login() {
        let f = fixture(SwapThenReject::default(), Some("token-a"));
        f.authorizer.inner().swap_to.lock().unwrap().replace(Arc::clone(&f.tokens));

        let response = f.authorizer.send(HttpRequest::get("/events")).await.unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(f.tokens.get().as_deref(), Some("token-b"));
        assert!(f.session.current().is_some());
        assert!(f.navigations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_passes_through_without_logout() {
        let f = fixture(Unreachable, Some("tok1"));

        let result = f.authorizer.send(HttpRequest::get("/x")).await;

        assert!(matches!(result, Err(TransportError::Unavailable(_))));
        assert_eq!(f.tokens.get().as_deref(), Some("tok1"));
        assert!(f.navigations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_closure_is_a_navigator() {
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let nav = move |_: &str| *h.lock().unwrap() += 1;

        nav.navigate("/auth/login");

        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
