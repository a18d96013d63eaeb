//! Purpose: Library crate behind the `eventdesk` CLI: the authenticated API gateway.
//! Exports: `api` (public surface), `core` (errors, config, session, transport), `notice`.
//! Role: Shared by the binary, integration tests, and embedding applications.
//! Invariants: Collaborators (session store, transport, navigator) are injected, never global.
pub mod api;
pub mod core;
pub mod notice;
