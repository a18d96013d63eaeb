//! Purpose: Schema for the stderr notice printed when a 401 ended the stored session.
//! Exports: `SessionExpiredNotice`, `SESSION_EXPIRED`.
//! Role: Tells a non-interactive caller that the credential is gone and where to sign in.
//! Invariants: One notice per redirect the gateway queued; never written to stdout.
//! Invariants: Serialized as a single `{"notice":{...}}` line; fields are additive-only.
use serde::Serialize;

pub const SESSION_EXPIRED: &str = "session_expired";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionExpiredNotice {
    pub kind: &'static str,
    pub time: String,
    pub cmd: String,
    /// Route the gateway asked the host to navigate to.
    pub route: String,
    /// Session file the credential was removed from.
    pub session_file: String,
    pub status: u16,
    pub message: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    notice: &'a SessionExpiredNotice,
}

impl SessionExpiredNotice {
    pub fn new(
        cmd: impl Into<String>,
        route: impl Into<String>,
        session_file: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            kind: SESSION_EXPIRED,
            time: time.into(),
            cmd: cmd.into(),
            route: route.into(),
            session_file: session_file.into(),
            status: 401,
            message: "session expired; run `eventdesk login` to sign in again".to_string(),
        }
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Envelope { notice: self })
    }
}
