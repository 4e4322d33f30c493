//! Host OS collaborators.
//!
//! The core never talks to the operating system directly. Background
//! execution, the notification surface, the control-signal transport and
//! bundled asset access are supplied by the embedding shell through these
//! traits (an Android service bridge, a desktop tray, or a test fake).

use std::sync::Arc;

use crate::config::ChannelSpec;
use crate::error::{HostError, SurfaceError, TransportError};
use crate::notification::RenderedNotification;
use crate::session::ServiceConnection;

/// Long-lived background execution context provider.
///
/// `bind` requests a background session; the host later reports the outcome
/// through [`ServiceConnection::on_service_connected`] or
/// [`ServiceConnection::on_service_disconnected`], from any thread and
/// possibly before `bind` returns.
pub trait ServiceHost: Send + Sync {
    fn bind(&self, connection: ServiceConnection) -> Result<(), HostError>;

    /// Release the binding made for `attempt` (see
    /// [`ServiceConnection::attempt`]). Must tolerate attempts that are no
    /// longer bound, and must leave newer bindings alone.
    fn unbind(&self, attempt: u64);
}

/// The OS-managed persistent notification.
///
/// Render calls may arrive from the artwork worker thread; implementations
/// that need a specific UI thread must marshal internally.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSurface: Send + Sync {
    fn create_channel(&self, channel: &ChannelSpec) -> Result<(), SurfaceError>;

    /// Show the notification and register it as the process's ongoing
    /// foreground notification.
    fn start_foreground(&self, id: i32, content: &RenderedNotification) -> Result<(), SurfaceError>;

    fn notify(&self, id: i32, content: &RenderedNotification) -> Result<(), SurfaceError>;

    fn cancel(&self, id: i32);

    fn stop_foreground(&self);
}

/// Callback invoked with the raw action identifier of each control signal
pub type ActionHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Broadcast-style delivery of notification button taps and media keys.
pub trait SignalTransport: Send + Sync {
    /// Subscribe `handler` to `actions`. The transport does not deduplicate
    /// subscriptions; every call adds a receiver.
    fn subscribe(&self, actions: &[&'static str], handler: ActionHandler) -> Result<(), TransportError>;
}

/// Read access to assets bundled with the application.
#[cfg_attr(test, mockall::automock)]
pub trait AssetSource: Send + Sync {
    fn open(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// The set of host collaborators a session binder is wired to
#[derive(Clone)]
pub struct Platform {
    pub host: Arc<dyn ServiceHost>,
    pub surface: Arc<dyn NotificationSurface>,
    pub transport: Arc<dyn SignalTransport>,
    pub assets: Arc<dyn AssetSource>,
}
