//! Purpose: Single error type shared by the gateway, session store, and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Every failure path normalizes into `Error`; callers match on `kind()`.
//! Invariants: `message()` is the human-readable text surfaced to callers unchanged.
//! Invariants: `status()` is set only when an HTTP response was received.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The transport never produced a response (DNS, connect, body read).
    Network,
    /// The server answered 401 and the session was torn down.
    Unauthorized,
    /// Any other non-2xx response.
    Http,
    /// A 2xx response whose body was not valid JSON.
    Decode,
    /// A 2xx response carrying `success: false` and a message.
    Domain,
    Usage,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    status: Option<u16>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            hint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            return write!(f, "{message}");
        }
        write!(f, "{:?}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Usage => 2,
        ErrorKind::Network => 3,
        ErrorKind::Unauthorized => 4,
        ErrorKind::Http => 5,
        ErrorKind::Decode => 6,
        ErrorKind::Domain => 7,
        ErrorKind::Io => 8,
    }
}
