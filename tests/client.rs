use incident_console::config::{ApiConfig, SessionConfig, Settings};
use incident_console::{ApiClient, AuthStatus, MemoryStorage, Session, TokenPair, TokenStorage};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(base_url: &str) -> Settings {
    Settings {
        environment: "test".to_string(),
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        },
        session: SessionConfig {
            storage_path: "unused".to_string(),
        },
    }
}

async fn client_with_tokens(server: &MockServer, access: &str, refresh: &str) -> (ApiClient, Arc<Session>) {
    let storage = MemoryStorage::new();
    storage
        .store(&TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        })
        .await
        .unwrap();
    let settings = settings(&server.uri());
    let session = Arc::new(Session::new(&settings, Box::new(storage)).unwrap());
    session.load().await.unwrap();
    let client = ApiClient::new(&settings, session.clone()).unwrap();
    (client, session)
}

async fn client_without_tokens(server: &MockServer) -> (ApiClient, Arc<Session>) {
    let settings = settings(&server.uri());
    let session = Arc::new(Session::new(&settings, Box::new(MemoryStorage::new())).unwrap());
    session.load().await.unwrap();
    let client = ApiClient::new(&settings, session.clone()).unwrap();
    (client, session)
}

#[tokio::test]
async fn test_bearer_attached_to_admin_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users/list"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with_tokens(&server, "A1", "R1").await;
    let accounts: Vec<serde_json::Value> = client.get_json("/admin/users/list").await.unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn test_no_bearer_when_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_without_tokens(&server).await;
    let resp = client.get("/admin/reports/incidents").await.unwrap();
    assert!(resp.status().is_success());
}

#[test_log::test(tokio::test)]
async fn test_401_triggers_one_refresh_and_one_retry() {
    let server = MockServer::start().await;
    // Stale token is rejected once
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    // Refreshed token succeeds
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 7,
            "user_id": null,
            "created": "2024-05-01 12:00:00",
            "url": null,
            "photo_path": null,
            "status": "pending",
            "published": false,
            "description": "broken street light"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"token": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client_with_tokens(&server, "A1", "R1").await;
    let incidents: Vec<serde_json::Value> =
        client.get_json("/admin/reports/incidents").await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0]["id"], 7);
    assert_eq!(session.access_token().as_deref(), Some("A2"));
}

#[tokio::test]
async fn test_second_401_is_not_retried() {
    let server = MockServer::start().await;
    // Rejects the original and the retried request alike
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with_tokens(&server, "A1", "R1").await;
    let err = client
        .get_json::<Vec<serde_json::Value>>("/admin/reports/incidents")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_refresh_failure_surfaces_401_and_closes_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // Requests after the forced logout carry no bearer header
    Mock::given(method("GET"))
        .and(path("/admin/users/list"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/users/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (client, session) = client_with_tokens(&server, "A1", "R1").await;
    let err = client.get("/admin/reports/incidents").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(session.auth_status(), AuthStatus::Unauthenticated);

    let resp = client.get("/admin/users/list").await.unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
async fn test_auth_paths_are_not_intercepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/refresh"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    // No refresh exchange may be triggered by an auth-path 401
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(0)
        .mount(&server)
        .await;

    let (client, session) = client_with_tokens(&server, "A1", "R1").await;
    let resp = client.get("/auth/refresh").await.unwrap();
    // The 401 passes straight through, session untouched
    assert_eq!(resp.status().as_u16(), 401);
    assert!(session.is_authenticated());
    assert_eq!(session.access_token().as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_non_401_errors_do_not_touch_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/reports/incidents"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, session) = client_with_tokens(&server, "A1", "R1").await;
    let err = client
        .get_json::<Vec<serde_json::Value>>("/admin/reports/incidents")
        .await
        .unwrap_err();
    assert!(!err.is_unauthorized());
    assert!(session.is_authenticated());
    assert_eq!(session.access_token().as_deref(), Some("A1"));
}
