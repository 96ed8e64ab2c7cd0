//! End-to-end tests over real HTTP: `AuthClient::connect` against a
//! `wiremock` server standing in for the backend.

use archipel::prelude::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, storage: &std::path::Path) -> ClientConfig {
    ClientConfig {
        api_url: format!("{}/api", server.uri()),
        storage_path: Some(storage.to_path_buf()),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn test_login_then_profile_over_http() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "usernameOrEmail": "testuser",
            "password": "password123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "tok1",
            "tokenType": "Bearer",
            "username": "testuser",
            "email": "t@example.com",
            "role": "USER"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"username": "testuser"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthClient::connect(config_for(&server, &dir.path().join("s.json"))).unwrap();
    client
        .login(&LoginRequest::new("testuser", "password123"))
        .await
        .unwrap();
    let me = client.profile().await.unwrap();

    assert_eq!(me["username"], "testuser");
}

#[tokio::test]
async fn test_persistent_token_survives_a_new_client() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "tok1",
            "username": "testuser"
        })))
        .mount(&server)
        .await;

    let first = AuthClient::connect(config_for(&server, &store)).unwrap();
    first.login(&LoginRequest::new("testuser", "pw")).await.unwrap();
    drop(first);

    let second = AuthClient::connect(config_for(&server, &store)).unwrap();

    assert_eq!(second.token().as_deref(), Some("tok1"));
    assert!(second.can_activate("/dashboard").is_allowed());
}

#[tokio::test]
async fn test_expired_session_over_http_clears_file_store() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "tok1",
            "username": "testuser"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = AuthClient::connect(config_for(&server, &store)).unwrap();
    client.login(&LoginRequest::new("testuser", "pw")).await.unwrap();

    let err = client.profile().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!client.is_authenticated());
    let reopened = AuthClient::connect(config_for(&server, &store)).unwrap();
    assert_eq!(reopened.token(), None);
}
