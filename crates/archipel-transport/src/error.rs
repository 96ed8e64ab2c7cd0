/// Errors that can occur in the transport layer.
///
/// A transport error means the server was never heard from. HTTP error
/// statuses are not transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The base URL or request path could not be turned into a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The HTTP client failed to send the request or read the response.
    #[cfg(feature = "reqwest")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server could not be reached.
    ///
    /// `ReqwestTransport` reports this case as [`Request`](Self::Request).
    /// This variant is for other [`HttpTransport`](crate::HttpTransport)
    /// implementations (an offline mode, a circuit breaker, a test
    /// double) that have no `reqwest::Error` to carry.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_names_the_reason() {
        let err = TransportError::Unavailable("offline mode".into());
        assert_eq!(err.to_string(), "service unavailable: offline mode");
        assert!(std::error::Error::source(&err).is_none());
    }
}
