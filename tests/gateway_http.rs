//! Purpose: End-to-end tests for the gateway over real loopback HTTP.
//! Exports: None (integration test module).
//! Role: Validate header policy, response normalization, and 401 handling through `ureq`.
//! Invariants: Uses the in-process axum mock backend; no external network.

mod common;

use common::{BULK_ENTRIES, GOOD_TOKEN, MockBackend};
use eventdesk::api::{
    ErrorKind, EventsService, Gateway, Method, QueuedNavigator, RequestOptions, Session,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

fn gateway(backend: &MockBackend, current_path: &str) -> (Gateway, Receiver<String>) {
    let (navigator, redirects) = QueuedNavigator::new(current_path);
    let gateway = Gateway::new(backend.base_url(), Session::in_memory())
        .with_navigator(Arc::new(navigator));
    (gateway, redirects)
}

#[test]
fn post_echo_returns_body_unchanged() {
    let backend = MockBackend::start();
    let (gateway, _redirects) = gateway(&backend, "/");

    let options = RequestOptions::new()
        .method(Method::Post)
        .json(&json!({"name": "New Item"}))
        .expect("json");
    let value = gateway.request("/items", options).expect("create");
    assert_eq!(value, json!({"success": true}));

    let options = RequestOptions::new()
        .method(Method::Post)
        .json(&json!({"name": "New Item"}))
        .expect("json");
    let echoed = gateway.request("/echo", options).expect("echo");
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["body"], "{\"name\":\"New Item\"}");
    assert_eq!(echoed["content_type"], "application/json");
    assert_eq!(echoed["authorization"], json!(null));
}

#[test]
fn stored_token_is_sent_as_bearer() {
    let backend = MockBackend::start();
    let (gateway, redirects) = gateway(&backend, "/events");
    gateway.session().login(GOOD_TOKEN, None).expect("login");

    let value = gateway.get("/protected").expect("protected");
    assert_eq!(value, json!({"ok": true}));
    assert!(redirects.try_recv().is_err());

    let options = RequestOptions::new()
        .header("Authorization", "Bearer caller")
        .header("X-Request-Id", "r-9");
    let echoed = gateway.request("/echo", options).expect("echo");
    assert_eq!(echoed["authorization"], format!("Bearer {GOOD_TOKEN}"));
    assert_eq!(echoed["x_request_id"], "r-9");
}

#[test]
fn caller_authorization_survives_without_stored_token() {
    let backend = MockBackend::start();
    let (gateway, _redirects) = gateway(&backend, "/");
    let options = RequestOptions::new().header("Authorization", "Bearer token123");
    let echoed = gateway.request("/echo", options).expect("echo");
    assert_eq!(echoed["authorization"], "Bearer token123");
}

#[test]
fn unauthorized_clears_session_and_queues_login_redirect() {
    let backend = MockBackend::start();
    let (gateway, redirects) = gateway(&backend, "/dashboard");
    gateway
        .session()
        .login("stale", Some("{\"id\":1}"))
        .expect("login");

    let err = gateway.get("/protected").expect_err("401");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.message(), Some("Token expired"));
    assert_eq!(err.status(), Some(401));
    assert_eq!(gateway.session().token().expect("token"), None);
    assert_eq!(gateway.session().user().expect("user"), None);
    assert_eq!(redirects.try_recv().expect("redirect"), "/login");
}

#[test]
fn non_json_server_error_uses_status_message() {
    let backend = MockBackend::start();
    let (gateway, _redirects) = gateway(&backend, "/");
    let err = gateway.get("/broken").expect_err("500");
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.message(), Some("HTTP error! status: 500"));
    assert_eq!(err.status(), Some(500));

    let err = gateway.get("/missing").expect_err("404");
    assert_eq!(err.message(), Some("Event not found"));
    assert_eq!(err.status(), Some(404));
}

#[test]
fn success_false_and_plain_text_bodies_fail() {
    let backend = MockBackend::start();
    let (gateway, _redirects) = gateway(&backend, "/");

    let err = gateway.get("/quota").expect_err("domain");
    assert_eq!(err.kind(), ErrorKind::Domain);
    assert_eq!(err.message(), Some("Quota exceeded"));
    assert_eq!(err.status(), Some(200));

    let err = gateway.get("/plain").expect_err("decode");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn events_service_reaches_organizer_route() {
    let backend = MockBackend::start();
    let (gateway, _redirects) = gateway(&backend, "/");
    let events = EventsService::new(gateway);
    let value = events.list_for_organizer("42").expect("list");
    assert_eq!(value, json!([{"id": 1, "organizer": "42", "title": "Gala"}]));
}

#[test]
fn unreachable_backend_is_network_error() {
    let gateway = Gateway::new("http://127.0.0.1:1/api", Session::in_memory());
    let err = gateway.get("/test").expect_err("network");
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.status(), None);
}

#[test]
fn oversized_success_body_is_decoded_in_full() {
    let backend = MockBackend::start();
    let (gateway, _redirects) = gateway(&backend, "/");
    let value = gateway.get("/bulk").expect("bulk");
    let entries = value.as_array().expect("array");
    assert_eq!(entries.len(), BULK_ENTRIES);
    assert_eq!(entries[BULK_ENTRIES - 1]["id"], BULK_ENTRIES - 1);
}

#[test]
fn oversized_unauthorized_body_still_clears_session() {
    let backend = MockBackend::start();
    let (gateway, redirects) = gateway(&backend, "/events");
    gateway.session().login("stale", None).expect("login");

    let err = gateway.get("/bulk-denied").expect_err("401");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.message(), Some("Token expired"));
    assert_eq!(gateway.session().token().expect("token"), None);
    assert_eq!(redirects.try_recv().expect("redirect"), "/login");
}
