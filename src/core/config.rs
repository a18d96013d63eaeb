//! Purpose: Resolve gateway configuration from the process environment.
//! Exports: `GatewayConfig`, `resolve_session_file`, `API_URL_ENV`, `SESSION_FILE_ENV`.
//! Role: Read once at startup; the gateway never re-reads the environment.
//! Invariants: The base address is taken verbatim; its shape is not validated.
use crate::core::error::{Error, ErrorKind};
use crate::core::session::default_session_file;
use std::path::PathBuf;

pub const API_URL_ENV: &str = "EVENTDESK_API_URL";
pub const SESSION_FILE_ENV: &str = "EVENTDESK_SESSION_FILE";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub session_file: PathBuf,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_file: default_session_file(),
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::resolve(None, None, |key| std::env::var(key).ok())
    }

    /// Explicit values win over the environment lookup.
    pub fn resolve(
        base_url: Option<String>,
        session_file: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let base_url = match base_url.or_else(|| env(API_URL_ENV)) {
            Some(url) => url,
            None => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("api base url is not configured")
                    .with_hint(format!("Set {API_URL_ENV} or pass --api-url.")));
            }
        };
        Ok(Self {
            base_url,
            session_file: resolve_session_file(session_file, env),
        })
    }
}

/// Session file location: explicit path, then `EVENTDESK_SESSION_FILE`, then
/// `~/.eventdesk/session.json`.
pub fn resolve_session_file(
    explicit: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    explicit
        .or_else(|| env(SESSION_FILE_ENV).map(PathBuf::from))
        .unwrap_or_else(default_session_file)
}
