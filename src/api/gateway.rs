//! Purpose: Authenticated JSON request gateway shared by every service call site.
//! Exports: `Gateway`, `NOT_AUTHENTICATED`.
//! Role: Builds the outgoing request, injects the bearer credential, and normalizes
//!       every response into either the decoded JSON body or one `Error`.
//! Invariants: Success returns the decoded body unchanged (object, array, or primitive).
//! Invariants: `Authorization` from the stored credential is applied last and wins.
//! Invariants: A 401 clears the session; at most one redirect is scheduled per expired credential.
//! Invariants: Each failure path logs exactly once and is never retried.
#![allow(clippy::result_large_err)]

use super::navigator::{LOGIN_ROUTE, Navigator, NoopNavigator, is_auth_route};
use super::request::RequestOptions;
use crate::core::config::GatewayConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::session::{FileStore, Session};
use crate::core::transport::{
    Headers, Method, OutgoingRequest, Transport, TransportResponse, UreqTransport,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

type ApiResult<T> = Result<T, Error>;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";

const UNAUTHORIZED: u16 = 401;

#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

#[derive(Clone)]
struct GatewayInner {
    base_url: String,
    session: Session,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                base_url: base_url.into(),
                session,
                transport: Arc::new(UreqTransport::new()),
                navigator: Arc::new(NoopNavigator),
            }),
        }
    }

    /// Gateway backed by the session file named in `config`.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let session = Session::new(Arc::new(FileStore::new(&config.session_file)));
        Self::new(config.base_url.clone(), session)
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        Arc::make_mut(&mut self.inner).transport = transport;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        Arc::make_mut(&mut self.inner).navigator = navigator;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Performs one authenticated call to `base_url + path`.
    ///
    /// `path` is appended verbatim, so callers supply the leading `/`.
    pub fn request(&self, path: &str, options: RequestOptions) -> ApiResult<Value> {
        let token = self
            .inner
            .session
            .token()
            .inspect_err(|err| error!(path, error = %err, "failed to read session credential"))?;
        let outgoing = self.build_request(path, options, token.as_deref());
        let response = match self.inner.transport.send(&outgoing) {
            Ok(response) => response,
            Err(err) => {
                error!(
                    method = %outgoing.method,
                    url = %outgoing.url,
                    error = %err,
                    "api request failed before a response arrived"
                );
                return Err(err);
            }
        };

        if response.status == UNAUTHORIZED {
            return Err(self.session_expired(&outgoing, &response, token.as_deref()));
        }
        if !response.is_success() {
            return Err(http_error(&outgoing, &response));
        }

        let value: Value = serde_json::from_slice(&response.body).map_err(|err| {
            error!(
                method = %outgoing.method,
                url = %outgoing.url,
                status = response.status,
                error = %err,
                "api response is not valid json"
            );
            Error::new(ErrorKind::Decode)
                .with_message(err.to_string())
                .with_source(err)
        })?;

        if let Some(message) = domain_failure_message(&value) {
            warn!(
                method = %outgoing.method,
                url = %outgoing.url,
                status = response.status,
                reason = %message,
                "api reported failure"
            );
            return Err(Error::new(ErrorKind::Domain)
                .with_message(message)
                .with_status(response.status));
        }

        Ok(value)
    }

    /// Like [`Gateway::request`], then decodes the body into `T`.
    pub fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let value = self.request(path, options)?;
        serde_json::from_value(value).map_err(|err| {
            error!(path, error = %err, "api response has unexpected shape");
            Error::new(ErrorKind::Decode)
                .with_message(err.to_string())
                .with_source(err)
        })
    }

    pub fn get(&self, path: &str) -> ApiResult<Value> {
        self.request(path, RequestOptions::new())
    }

    pub fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> ApiResult<Value> {
        self.request(path, RequestOptions::new().method(Method::Post).json(body)?)
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> ApiResult<Value> {
        self.request(path, RequestOptions::new().method(Method::Put).json(body)?)
    }

    pub fn delete(&self, path: &str) -> ApiResult<Value> {
        self.request(path, RequestOptions::new().method(Method::Delete))
    }

    fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> OutgoingRequest {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        headers.merge(&options.headers);
        if let Some(token) = token {
            headers.set("Authorization", format!("Bearer {token}"));
        }
        OutgoingRequest {
            url: format!("{}{}", self.inner.base_url, path),
            method: options.method,
            headers,
            body: options.body,
            credentials: options.credentials,
        }
    }

    /// `token` is the credential the rejected call carried.
    fn session_expired(
        &self,
        outgoing: &OutgoingRequest,
        response: &TransportResponse,
        token: Option<&str>,
    ) -> Error {
        // Claim before clearing: a concurrent call that read no token must see the claim.
        let current = self.inner.navigator.current_path();
        let redirect = !is_auth_route(&current) && self.inner.session.claim_expiry(token);
        if let Err(err) = self.inner.session.clear() {
            warn!(error = %err, "failed to clear session after 401");
        }
        if redirect {
            self.inner.navigator.schedule_redirect(LOGIN_ROUTE);
        }

        let message =
            error_body_message(&response.body).unwrap_or_else(|| NOT_AUTHENTICATED.to_string());
        warn!(
            method = %outgoing.method,
            url = %outgoing.url,
            current = %current,
            reason = %message,
            "api session expired"
        );
        Error::new(ErrorKind::Unauthorized)
            .with_message(message)
            .with_status(UNAUTHORIZED)
    }
}

fn http_error(outgoing: &OutgoingRequest, response: &TransportResponse) -> Error {
    let message = error_body_message(&response.body)
        .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
    warn!(
        method = %outgoing.method,
        url = %outgoing.url,
        status = response.status,
        reason = %message,
        "api request rejected"
    );
    Error::new(ErrorKind::Http)
        .with_message(message)
        .with_status(response.status)
}

/// The `message` string of a JSON error body, when present and non-empty.
fn error_body_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    non_empty_message(&value)
}

fn domain_failure_message(value: &Value) -> Option<String> {
    if value.get("success") != Some(&Value::Bool(false)) {
        return None;
    }
    non_empty_message(value)
}

fn non_empty_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
