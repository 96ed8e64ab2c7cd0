//! HTTP transport implementation using `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    Headers, HttpRequest, HttpResponse, HttpTransport, Method, RequestId,
    TransportError,
};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// An [`HttpTransport`] that resolves request paths against a base URL
/// (for example `http://localhost:8080/api`).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest::Client`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a transport around an existing client (timeouts, proxies,
    /// TLS settings are the caller's business).
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
    ) -> Result<Self, TransportError> {
        reqwest::Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<reqwest::Url, TransportError> {
        let full = if path.starts_with("http://") || path.starts_with("https://")
        {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        reqwest::Url::parse(&full)
            .map_err(|e| TransportError::InvalidUrl(format!("{full}: {e}")))
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl HttpTransport for ReqwestTransport {
    type Error = TransportError;

    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, Self::Error> {
        let id = RequestId::new(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed));
        let url = self.resolve(&request.path)?;
        tracing::debug!(%id, method = %request.method, %url, "sending request");

        let mut builder =
            self.client.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(TransportError::Request)?;
        let status = response.status().as_u16();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(TransportError::Request)?
            .to_vec();

        tracing::debug!(%id, status, "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = ReqwestTransport::new("not a url");
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_strips_trailing_slash() {
        let t = ReqwestTransport::new("http://localhost:8080/api/").unwrap();
        assert_eq!(t.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_resolve_joins_relative_paths() {
        let t = ReqwestTransport::new("http://localhost:8080/api").unwrap();

        let with_slash = t.resolve("/auth/login").unwrap();
        let without_slash = t.resolve("auth/login").unwrap();

        assert_eq!(with_slash.as_str(), "http://localhost:8080/api/auth/login");
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn test_resolve_keeps_absolute_urls() {
        let t = ReqwestTransport::new("http://localhost:8080/api").unwrap();
        let url = t.resolve("https://other.example.com/x").unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/x");
    }
}
