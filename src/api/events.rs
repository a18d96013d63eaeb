//! Purpose: Event endpoints of the planning API, issued through the gateway.
//! Exports: `EventsService`.
//! Role: Thin call sites; payloads stay `serde_json::Value` and errors pass through unchanged.
//! Invariants: Identifiers are percent-encoded as single path segments.
#![allow(clippy::result_large_err)]

use super::gateway::Gateway;
use crate::core::error::{Error, ErrorKind};
use serde_json::Value;
use url::Url;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct EventsService {
    gateway: Gateway,
}

impl EventsService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn list_for_organizer(&self, organizer_id: &str) -> ApiResult<Value> {
        self.gateway
            .get(&segment_path(&["events", "organizer", organizer_id])?)
    }

    pub fn get(&self, event_id: &str) -> ApiResult<Value> {
        self.gateway.get(&segment_path(&["events", event_id])?)
    }

    pub fn create(&self, event: &Value) -> ApiResult<Value> {
        self.gateway.post_json("/events", event)
    }

    pub fn update(&self, event_id: &str, event: &Value) -> ApiResult<Value> {
        self.gateway
            .put_json(&segment_path(&["events", event_id])?, event)
    }

    pub fn delete(&self, event_id: &str) -> ApiResult<Value> {
        self.gateway.delete(&segment_path(&["events", event_id])?)
    }
}

fn segment_path(segments: &[&str]) -> ApiResult<String> {
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(Error::new(ErrorKind::Usage).with_message("path segment must not be empty"));
    }
    let mut url = Url::parse("http://localhost/").map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("failed to build request path")
            .with_source(err)
    })?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("failed to build request path")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url.path().to_string())
}
