//! Purpose: Host-side navigation hooks used when a session expires.
//! Exports: `Navigator`, `QueuedNavigator`, `NoopNavigator`, `is_auth_route`, `LOGIN_ROUTE`.
//! Role: Decouples the gateway from any concrete navigation mechanism.
//! Invariants: `schedule_redirect` must not navigate synchronously; hosts perform it later.
//! Invariants: Redirects are never scheduled while on a login or registration route.
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn schedule_redirect(&self, target: &str);
}

/// True for `/login`, `/register`, and anything prefixed by either.
pub fn is_auth_route(path: &str) -> bool {
    path.starts_with(LOGIN_ROUTE) || path.starts_with(REGISTER_ROUTE)
}

/// Navigator that queues redirects for the host to drain.
#[derive(Clone)]
pub struct QueuedNavigator {
    current: Arc<Mutex<String>>,
    sender: Sender<String>,
}

impl QueuedNavigator {
    pub fn new(current_path: impl Into<String>) -> (Self, Receiver<String>) {
        let (sender, receiver) = mpsc::channel();
        let navigator = Self {
            current: Arc::new(Mutex::new(current_path.into())),
            sender,
        };
        (navigator, receiver)
    }

    pub fn set_current_path(&self, path: impl Into<String>) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        *current = path.into();
    }
}

impl Navigator for QueuedNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    fn schedule_redirect(&self, target: &str) {
        // A dropped receiver means the host stopped listening.
        let _ = self.sender.send(target.to_string());
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn schedule_redirect(&self, _target: &str) {}
}

#[cfg(test)]
mod tests {
    use super::{Navigator, QueuedNavigator, is_auth_route};

    #[test]
    fn auth_routes_match_exact_and_prefix() {
        assert!(is_auth_route("/login"));
        assert!(is_auth_route("/login/reset"));
        assert!(is_auth_route("/register"));
        assert!(is_auth_route("/register?step=2"));
        assert!(!is_auth_route("/"));
        assert!(!is_auth_route("/dashboard/login"));
        assert!(!is_auth_route("/events"));
    }

    #[test]
    fn queued_navigator_defers_until_drained() {
        let (navigator, receiver) = QueuedNavigator::new("/events");
        assert_eq!(navigator.current_path(), "/events");
        navigator.schedule_redirect("/login");
        navigator.set_current_path("/login");

        assert_eq!(receiver.try_recv().expect("queued"), "/login");
        assert!(receiver.try_recv().is_err());
        assert_eq!(navigator.current_path(), "/login");
    }
}
