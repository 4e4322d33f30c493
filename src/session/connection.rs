use std::fmt;
use std::sync::Weak;

use super::binder::BinderShared;

/// Token for one bind attempt, handed to the [`ServiceHost`].
///
/// The host reports the outcome of the attempt through it. Once the binder
/// moves past the attempt (a detach, a newer bind) the token goes stale and
/// its callbacks are ignored.
///
/// [`ServiceHost`]: crate::platform::ServiceHost
#[derive(Clone)]
pub struct ServiceConnection {
    attempt: u64,
    binder: Weak<BinderShared>,
}

impl ServiceConnection {
    pub(super) fn new(attempt: u64, binder: Weak<BinderShared>) -> Self {
        Self { attempt, binder }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// The background context is up and bound.
    pub fn on_service_connected(&self) {
        match self.binder.upgrade() {
            Some(binder) => binder.handle_connected(self.attempt),
            None => log::debug!("Session #{} connected after binder was dropped", self.attempt),
        }
    }

    /// The host lost or killed the background context.
    pub fn on_service_disconnected(&self) {
        match self.binder.upgrade() {
            Some(binder) => binder.handle_disconnected(self.attempt),
            None => log::debug!("Session #{} disconnected after binder was dropped", self.attempt),
        }
    }
}

impl fmt::Debug for ServiceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConnection")
            .field("attempt", &self.attempt)
            .finish()
    }
}
