use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::artwork::ArtworkRef;
use crate::error::ProjectorError;
use crate::state_machine::ProjectorState;
use crate::notification::{
    NotificationHandle, NotificationProjector, NotificationState, RenderedNotification,
};

/// Shared handle to the live session, delivered with the `Binder` event
pub type SessionHandle = Arc<MediaSession>;

/// The single background session hosting the playback notification.
///
/// Created by the binder when the host reports a connection, with its
/// notification already set up. The application pushes playback state
/// through it for as long as it stays connected.
pub struct MediaSession {
    id: u64,
    connected_at: DateTime<Utc>,
    notification: NotificationHandle,
    projector: NotificationProjector,
}

impl MediaSession {
    pub(crate) fn start(id: u64, projector: NotificationProjector) -> Result<SessionHandle, ProjectorError> {
        let notification = projector.setup()?;
        Ok(Arc::new(Self {
            id,
            connected_at: Utc::now(),
            notification,
            projector,
        }))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn notification(&self) -> &NotificationHandle {
        &self.notification
    }

    pub(crate) fn projector(&self) -> &NotificationProjector {
        &self.projector
    }

    pub fn update(&self, state: NotificationState) -> Result<(), ProjectorError> {
        self.projector.update(state)
    }

    pub fn update_playback(
        &self,
        is_playing: bool,
        title: impl Into<String>,
        artist: Option<String>,
    ) -> Result<(), ProjectorError> {
        self.projector.update_playback(is_playing, title, artist)
    }

    pub fn update_cover(&self, artwork: ArtworkRef) -> Result<(), ProjectorError> {
        self.projector.update_cover(artwork)
    }

    pub fn rendered(&self) -> Option<RenderedNotification> {
        self.projector.rendered()
    }

    pub fn state(&self) -> ProjectorState {
        self.projector.state()
    }

    /// False once the session was detached or dropped by the host
    pub fn is_active(&self) -> bool {
        self.projector.is_active()
    }

    pub(crate) fn shut_down(&self) {
        self.projector.teardown();
    }
}

impl fmt::Debug for MediaSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSession")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("notification", &self.notification)
            .field("state", &self.projector.state())
            .finish()
    }
}
