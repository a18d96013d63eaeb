//! Purpose: Define the stable public Rust API boundary for eventdesk.
//! Exports: Gateway, request options, navigation hooks, service modules, and core types.
//! Role: Public, additive-only surface for embedders and the CLI.
//! Invariants: Every request issued through this module goes through `Gateway::request`.
//! Invariants: Failures surface as `Error`; callers match on `ErrorKind`.

pub mod events;
mod gateway;
mod navigator;
mod request;

pub use crate::core::config::{
    API_URL_ENV, GatewayConfig, SESSION_FILE_ENV, resolve_session_file,
};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::session::{
    FileStore, MemoryStore, Session, SessionStore, TOKEN_KEY, USER_KEY, default_session_file,
};
pub use crate::core::transport::{
    CredentialsMode, Headers, Method, OutgoingRequest, Transport, TransportResponse,
    UreqTransport,
};
pub use events::EventsService;
pub use gateway::{Gateway, NOT_AUTHENTICATED};
pub use navigator::{
    LOGIN_ROUTE, Navigator, NoopNavigator, QueuedNavigator, REGISTER_ROUTE, is_auth_route,
};
pub use request::RequestOptions;
