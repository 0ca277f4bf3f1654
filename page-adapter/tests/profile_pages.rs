use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use mock_api::JsonStore;
use page_adapter::{Adapter, ProfilePages, ProxyEvent, ProxyResponse};
use shared::Config;

// ── Helpers ──

/// Serve the mock API on an ephemeral port and return its base URL.
async fn spawn_mock_api() -> String {
    let store = JsonStore::in_memory(json!({
        "users": [
            { "id": "1", "handle": "alice", "name": "Alice Johnson", "email": "alice@example.com", "timezone": "UTC" },
            { "id": "2", "handle": "bob", "name": "Bob Smith", "email": "bob@example.com", "timezone": "UTC",
              "avatarUrl": "https://example.com/bob.png" },
            { "id": "3", "handle": "carol", "name": "Carol Diaz", "email": "carol@example.com", "timezone": "UTC" }
        ],
        "meeting_types": [
            { "id": "10", "userId": "1", "name": "Intro", "duration": 15, "price": 0,
              "description": "Say hi", "iconType": "chat", "active": true },
            { "id": "11", "userId": "1", "name": "Retired", "duration": 30, "price": 0,
              "description": "Old", "iconType": "Clock", "active": false },
            { "id": "12", "userId": "2", "name": "Coffee", "duration": 30, "price": 5,
              "description": "Beans", "iconType": "meeting", "color": "#123456", "active": true },
            { "id": "20", "userId": "3", "name": "Phone screen", "duration": 20, "price": 0,
              "description": "Call", "iconType": "phone", "active": true },
            { "id": "21", "userId": "3", "name": "Broken", "price": "free", "active": true }
        ]
    }))
    .unwrap();

    let app = mock_api::router(Arc::new(store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn adapter_for(base_url: &str) -> Adapter<ProfilePages> {
    let config = Config::new(base_url).with_timeout(Duration::from_secs(5));
    Adapter::new(ProfilePages::new(config))
}

fn get(path: &str) -> ProxyEvent {
    serde_json::from_value(json!({
        "path": path,
        "httpMethod": "GET",
        "headers": { "Host": "calendar.example.com" },
        "requestContext": { "identity": { "sourceIp": "203.0.113.1" } }
    }))
    .unwrap()
}

fn body(response: &ProxyResponse) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

// ── Pages ──

#[tokio::test]
async fn test_landing_page() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let response = adapter.invoke(&get("/")).await;

    assert_eq!(response.status_code, 200);
    assert!(body(&response).get("message").is_some());
}

#[tokio::test]
async fn test_profile_page_lists_active_meeting_types() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let response = adapter.invoke(&get("/alice")).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["content-type"], "application/json");

    let page = body(&response);
    assert_eq!(page["user"]["handle"], "alice");
    assert_eq!(page["initials"], "AJ");
    assert!(page["avatarColor"].is_string());

    let types = page["meetingTypes"].as_array().unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0]["name"], "Intro");
    assert!(types[0]["displayColor"].is_string());
}

#[tokio::test]
async fn test_profile_with_avatar_has_no_generated_color() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let page = body(&adapter.invoke(&get("/bob")).await);

    assert!(page.get("avatarColor").is_none());
    assert_eq!(page["meetingTypes"][0]["displayColor"], "#123456");
}

#[tokio::test]
async fn test_unrecognized_or_malformed_rows_do_not_break_profile() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let response = adapter.invoke(&get("/carol")).await;

    assert_eq!(response.status_code, 200);
    let types = body(&response)["meetingTypes"].as_array().unwrap().clone();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0]["name"], "Phone screen");
    assert_eq!(types[0]["iconType"], "unknown");

    assert_eq!(adapter.invoke(&get("/carol/20")).await.status_code, 200);
}

#[tokio::test]
async fn test_unknown_profile_is_404() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let response = adapter.invoke(&get("/nobody")).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(body(&response), json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_booking_page() {
    let adapter = adapter_for(&spawn_mock_api().await);

    let response = adapter.invoke(&get("/alice/10")).await;
    assert_eq!(response.status_code, 200);
    let page = body(&response);
    assert_eq!(page["user"]["id"], "1");
    assert_eq!(page["meetingType"]["id"], "10");

    let response = adapter.invoke(&get("/alice/12")).await;
    assert_eq!(response.status_code, 404);
    assert_eq!(body(&response), json!({ "error": "Meeting type not found" }));
}

#[tokio::test]
async fn test_inactive_meeting_type_has_no_booking_page() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let response = adapter.invoke(&get("/alice/11")).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(body(&response), json!({ "error": "Meeting type not found" }));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let adapter = adapter_for(&spawn_mock_api().await);
    let response = adapter.invoke(&get("/a/b/c")).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(body(&response), json!({ "error": "Page not found" }));
}

// ── Failure handling ──

#[tokio::test]
async fn test_unreachable_api_fails_preparation() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let adapter = adapter_for(&format!("http://{}", addr));
    let response = adapter.invoke(&get("/alice")).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.headers["content-type"], "application/json");
    assert!(body(&response).get("error").is_some());
    assert!(!adapter.is_prepared());
}
