//! Background media session controller.
//!
//! Keeps one background session alive while audio plays, projects the
//! current track into the OS's persistent notification and turns taps on that
//! notification into control events for the owning application.
//!
//! ```ignore
//! let binder = audio_manager::session::global::install(platform, ServiceConfig::default());
//! binder.register_control_receiver()?;
//! binder.attach(Some(&listener));
//! // later, from the `Binder` event:
//! session.update(NotificationState::new("Song", true).with_artist("Artist"))?;
//! ```

pub mod artwork;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod notification;
pub mod platform;
pub mod session;
pub mod state_machine;
pub mod utils;

#[cfg(test)]
mod tests;

pub use artwork::{Artwork, ArtworkRef, CoverArtLoader};
pub use config::{ChannelSpec, Importance, ServiceConfig};
pub use control::{ControlEventBus, ControlSignal};
pub use error::{ArtworkError, ConfigError, HostError, ProjectorError, SurfaceError, TransportError};
pub use events::{ServiceEvent, ServiceEvents};
pub use notification::{NotificationProjector, NotificationState, RenderedNotification};
pub use platform::{AssetSource, NotificationSurface, Platform, ServiceHost, SignalTransport};
pub use session::{MediaSession, ServiceConnection, SessionBinder, SessionHandle};
pub use state_machine::ProjectorState;
pub use utils::logger::init_logging;
