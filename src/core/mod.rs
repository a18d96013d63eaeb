// Core modules: error model, configuration, session storage, and HTTP transport.
pub mod config;
pub mod error;
pub mod session;
pub mod transport;
