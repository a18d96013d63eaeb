//! Purpose: Loopback mock of the planning API for integration tests.
//! Exports: `MockBackend`.
//! Role: Serves fixed routes covering every gateway response branch.
//! Invariants: Binds 127.0.0.1 on an ephemeral port; runs on its own tokio runtime thread.
//! Invariants: `GET /protected` accepts only `Authorization: Bearer good`.
#![allow(dead_code)]

use axum::Router;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::mpsc;

pub const GOOD_TOKEN: &str = "good";
/// Entry count of `GET /bulk`; its body is well over 10 MiB.
pub const BULK_ENTRIES: usize = 200_000;

pub struct MockBackend {
    addr: SocketAddr,
}

impl MockBackend {
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind");
                tx.send(listener.local_addr().expect("addr"))
                    .expect("send addr");
                axum::serve(listener, router()).await.expect("serve");
            });
        });
        let addr = rx.recv().expect("backend addr");
        Self { addr }
    }

    /// Base address with an `/api` prefix, as deployments configure it.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

fn router() -> Router {
    Router::new()
        .route("/api/echo", any(echo))
        .route("/api/items", post(create_item))
        .route("/api/protected", get(protected))
        .route("/api/broken", get(broken))
        .route("/api/missing", get(missing))
        .route("/api/quota", get(quota))
        .route("/api/plain", get(plain))
        .route("/api/events/organizer/:id", get(events_for_organizer))
        .route("/api/bulk", get(bulk))
        .route("/api/bulk-denied", get(bulk_denied))
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    axum::Json(json!({
        "method": method.as_str(),
        "body": body,
        "authorization": header("authorization"),
        "content_type": header("content-type"),
        "x_request_id": header("x-request-id"),
    }))
    .into_response()
}

async fn create_item(body: String) -> Response {
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    if parsed.get("name").is_some() {
        (StatusCode::CREATED, axum::Json(json!({"success": true}))).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({"message": "name is required"})),
        )
            .into_response()
    }
}

async fn protected(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {GOOD_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if authorized {
        axum::Json(json!({"ok": true})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"message": "Token expired"})),
        )
            .into_response()
    }
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn missing() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({"message": "Event not found"})),
    )
        .into_response()
}

async fn quota() -> Response {
    axum::Json(json!({"success": false, "message": "Quota exceeded"})).into_response()
}

async fn plain() -> Response {
    (StatusCode::OK, "hello").into_response()
}

async fn events_for_organizer(axum::extract::Path(id): axum::extract::Path<String>) -> Response {
    axum::Json(json!([{"id": 1, "organizer": id, "title": "Gala"}])).into_response()
}

fn bulk_entries() -> Vec<Value> {
    (0..BULK_ENTRIES)
        .map(|id| json!({"id": id, "title": "Quarterly planning summit", "venue": "Hall A"}))
        .collect()
}

async fn bulk() -> Response {
    axum::Json(Value::Array(bulk_entries())).into_response()
}

async fn bulk_denied() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({"message": "Token expired", "audit": bulk_entries()})),
    )
        .into_response()
}
