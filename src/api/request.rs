//! Purpose: Per-call request descriptor handed to `Gateway::request`.
//! Exports: `RequestOptions`.
//! Role: Caller-side overrides for method, headers, body, and pass-through transport options.
//! Invariants: Method defaults to GET; the body is sent exactly as stored.
use crate::core::error::{Error, ErrorKind};
use crate::core::transport::{CredentialsMode, Headers, Method};
use serde::Serialize;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestOptions {
    pub(crate) method: Method,
    pub(crate) headers: Headers,
    pub(crate) body: Option<String>,
    pub(crate) credentials: Option<CredentialsMode>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers.merge(headers);
        self
    }

    /// Raw body, sent as-is.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` to compact JSON and uses it as the body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, Error> {
        let body = serde_json::to_string(value).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("failed to encode request json")
                .with_source(err)
        })?;
        Ok(self.body(body))
    }

    pub fn credentials(mut self, mode: CredentialsMode) -> Self {
        self.credentials = Some(mode);
        self
    }
}
