//! The persistent playback notification.

mod projector;
mod template;

pub use projector::{NotificationHandle, NotificationProjector};
pub use template::{NotificationButton, NotificationState, PlaybackIcon, RenderedNotification};
