//! Shared fixtures for the facade integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use archipel::{
    AuthClient, AuthClientBuilder, ClientConfig, HttpRequest, HttpResponse,
    HttpTransport, StorageScope, TokenStore,
};
use archipel_transport::TransportError;

/// Payload `{"sub":"testuser","email":"test@example.com","role":"MODERATOR"}`.
pub const MODERATOR_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
    eyJzdWIiOiJ0ZXN0dXNlciIsImVtYWlsIjoidGVzdEBleGFtcGxlLmNvbSIsInJvbGUiOiJNT0RFUkFUT1IifQ.\
    signature";

pub const LOGIN_OK: &str = r#"{"accessToken":"tok1","tokenType":"Bearer","username":"testuser","email":"t@example.com","role":"USER"}"#;

/// A transport that replies from a queue and records every request.
///
/// Clones share the same queue and log, so a test can keep one handle
/// while the client owns the other.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next request.
    pub fn push(&self, status: u16, body: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, body));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

impl HttpTransport for MockTransport {
    type Error = TransportError;

    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, Self::Error> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Unavailable("no reply queued".into()))
    }
}

/// A client over a fresh mock with in-memory storage, plus the handles a
/// test needs to look behind it.
pub struct Harness {
    pub client: AuthClient<MockTransport>,
    pub mock: MockTransport,
    pub tokens: Arc<TokenStore>,
    pub navigations: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(TokenStore::in_memory("auth_token", StorageScope::Persistent))
    }

    pub fn with_store(tokens: TokenStore) -> Self {
        let tokens = Arc::new(tokens);
        let mock = MockTransport::new();
        let navigations = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&navigations);

        let client = AuthClientBuilder::new(ClientConfig::default())
            .token_store(Arc::clone(&tokens))
            .navigator(move |route: &str| sink.lock().unwrap().push(route.to_string()))
            .build(mock.clone())
            .expect("default config is valid");

        Self {
            client,
            mock,
            tokens,
            navigations,
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}
