//! Integration tests for the reqwest transport.
//!
//! These spin up a real HTTP listener with `wiremock` and check that
//! requests arrive with the right method, path, headers and body, and
//! that every status code comes back as an `Ok` response.

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use archipel_transport::{
        HttpRequest, HttpTransport, ReqwestTransport, TransportError,
    };
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn transport_for(server: &MockServer) -> ReqwestTransport {
        ReqwestTransport::new(&format!("{}/api", server.uri()))
            .expect("mock server uri should parse")
    }

    #[tokio::test]
    async fn test_send_post_with_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Bearer tok1"))
            .and(body_string(r#"{"a":1}"#))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let request = HttpRequest::post("/auth/login")
            .with_header("Authorization", "Bearer tok1")
            .with_json(br#"{"a":1}"#.to_vec());

        let response = transport.send(request).await.expect("should send");

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "ok");
    }

    #[tokio::test]
    async fn test_send_error_status_is_not_a_transport_error() {
        // A 401 is a perfectly good answer from the server. The transport
        // must hand it back so the layer above can react to it.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/protected"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("Unauthorized"),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let response = transport
            .send(HttpRequest::get("/protected"))
            .await
            .expect("401 is still a response");

        assert!(response.is_unauthorized());
        assert_eq!(response.text(), "Unauthorized");
    }

    #[tokio::test]
    async fn test_send_copies_response_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Request-Trace", "abc")
                    .set_body_string("{}"),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let response =
            transport.send(HttpRequest::get("/users/me")).await.unwrap();

        assert_eq!(response.header("x-request-trace"), Some("abc"));
    }

    #[tokio::test]
    async fn test_send_to_closed_port_returns_request_error() {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport =
            ReqwestTransport::new(&format!("http://127.0.0.1:{port}/api")).unwrap();
        let result = transport.send(HttpRequest::get("/anything")).await;

        assert!(
            matches!(result, Err(TransportError::Request(_))),
            "expected a request error, got {result:?}"
        );
    }
}
