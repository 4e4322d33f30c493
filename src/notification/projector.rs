use std::sync::{Arc, Mutex, MutexGuard};

use super::template::{NotificationState, RenderedNotification};
use crate::artwork::{Artwork, ArtworkRef, CoverArtLoader};
use crate::config::ServiceConfig;
use crate::error::ProjectorError;
use crate::platform::NotificationSurface;
use crate::state_machine::{ProjectorState, ProjectorStateMachine};
use crate::utils::sync::lock_or_recover;

/// Identity of the session's notification once set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHandle {
    pub id: i32,
    pub channel_id: String,
}

/// Owns the notification template of one session and drives the surface.
///
/// Every surface call happens under the projector lock, so renders reach
/// the surface in call order and a late artwork result can never interleave
/// with an update.
#[derive(Clone)]
pub struct NotificationProjector {
    inner: Arc<Mutex<ProjectorInner>>,
    surface: Arc<dyn NotificationSurface>,
    loader: Arc<CoverArtLoader>,
    config: Arc<ServiceConfig>,
}

#[derive(Default)]
struct ProjectorInner {
    machine: ProjectorStateMachine,
    state: NotificationState,
    art: ArtworkSlot,
    rendered: Option<RenderedNotification>,
}

/// Cover art bookkeeping, committed together with the render it belongs to
#[derive(Clone, Default)]
struct ArtworkSlot {
    current: Option<Artwork>,
    /// Reference `current` was resolved from
    source: Option<ArtworkRef>,
    /// Remote reference currently being fetched
    pending: Option<ArtworkRef>,
    /// Last reference that could not be loaded; not retried until another
    /// reference is requested
    failed: Option<ArtworkRef>,
}

impl NotificationProjector {
    pub fn new(
        surface: Arc<dyn NotificationSurface>,
        loader: Arc<CoverArtLoader>,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProjectorInner::default())),
            surface,
            loader,
            config,
        }
    }

    /// Register the channel and show the blank template as the foreground
    /// notification. Only valid once.
    pub fn setup(&self) -> Result<NotificationHandle, ProjectorError> {
        let mut inner = self.lock();
        inner.machine.transition_to(ProjectorState::Active)?;

        let blank = RenderedNotification::blank(&self.config);
        let result = self
            .surface
            .create_channel(&self.config.channel)
            .and_then(|_| self.surface.start_foreground(self.config.notification_id, &blank));

        if let Err(e) = result {
            log::error!("[NOTIFICATION] setup failed: {}", e);
            inner.machine.force_state(ProjectorState::Uninitialized);
            return Err(e.into());
        }

        inner.rendered = Some(blank);
        log::info!(
            "[NOTIFICATION] foreground notification {} active on channel '{}'",
            self.config.notification_id,
            self.config.channel.id
        );

        Ok(NotificationHandle {
            id: self.config.notification_id,
            channel_id: self.config.channel.id.clone(),
        })
    }

    /// Replace the rendered content with `state` and refresh the surface.
    ///
    /// Remote artwork is fetched in the background; until it arrives the
    /// previous artwork stays on screen.
    pub fn update(&self, state: NotificationState) -> Result<(), ProjectorError> {
        let remote = {
            let mut inner = self.lock();
            inner.ensure_active("update")?;

            let (art, remote) = self.plan_artwork(&inner.art, state.artwork.as_ref());
            let rendered = RenderedNotification::render(&state, art.current.clone(), &self.config);
            self.surface.notify(self.config.notification_id, &rendered)?;

            inner.state = state;
            inner.art = art;
            inner.rendered = Some(rendered);
            remote
        };

        if let Some(artwork) = remote {
            self.request_remote_artwork(artwork);
        }
        Ok(())
    }

    /// Update title, artist and play state, keeping the current artwork.
    pub fn update_playback(
        &self,
        is_playing: bool,
        title: impl Into<String>,
        artist: Option<String>,
    ) -> Result<(), ProjectorError> {
        let next = NotificationState {
            title: title.into(),
            artist,
            artwork: self.lock().state.artwork.clone(),
            is_playing,
        };
        self.update(next)
    }

    /// Swap the cover art, keeping everything else.
    pub fn update_cover(&self, artwork: ArtworkRef) -> Result<(), ProjectorError> {
        let next = NotificationState {
            artwork: Some(artwork),
            ..self.lock().state.clone()
        };
        self.update(next)
    }

    /// Cancel the notification and release foreground status.
    ///
    /// A no-op before setup and after a previous teardown.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        match inner.machine.current() {
            ProjectorState::Uninitialized => {
                log::debug!("[NOTIFICATION] teardown before setup, nothing to cancel");
            }
            ProjectorState::TornDown => {
                log::debug!("[NOTIFICATION] already torn down");
            }
            ProjectorState::Active => {
                self.surface.cancel(self.config.notification_id);
                self.surface.stop_foreground();
                if let Err(e) = inner.machine.transition_to(ProjectorState::TornDown) {
                    log::error!("[NOTIFICATION] {}", e);
                }
                inner.rendered = None;
                inner.art.pending = None;
                log::info!(
                    "[NOTIFICATION] notification {} cancelled",
                    self.config.notification_id
                );
            }
        }
    }

    pub fn state(&self) -> ProjectorState {
        self.lock().machine.current()
    }

    pub fn is_active(&self) -> bool {
        self.lock().machine.can_render()
    }

    /// The last state pushed through `update`
    pub fn current(&self) -> NotificationState {
        self.lock().state.clone()
    }

    /// What the surface is currently showing, if anything
    pub fn rendered(&self) -> Option<RenderedNotification> {
        self.lock().rendered.clone()
    }

    pub fn has_pending_artwork(&self) -> bool {
        self.lock().art.pending.is_some()
    }

    /// Work out the artwork slot for `wanted` without touching the
    /// projector. Returns the remote reference to fetch, if any.
    fn plan_artwork(
        &self,
        slot: &ArtworkSlot,
        wanted: Option<&ArtworkRef>,
    ) -> (ArtworkSlot, Option<ArtworkRef>) {
        let Some(wanted) = wanted else {
            return (ArtworkSlot::default(), None);
        };

        let mut next = slot.clone();
        if next.source.as_ref() == Some(wanted) {
            next.pending = None;
            return (next, None);
        }
        if next.failed.as_ref() == Some(wanted) {
            next.pending = None;
            return (next, None);
        }
        next.failed = None;

        if wanted.is_remote() {
            if next.pending.as_ref() == Some(wanted) {
                return (next, None);
            }
            next.pending = Some(wanted.clone());
            return (next, Some(wanted.clone()));
        }

        next.pending = None;
        match self.loader.resolve(wanted) {
            Ok(artwork) => {
                next.current = Some(artwork);
                next.source = Some(wanted.clone());
            }
            Err(e) => {
                log::warn!("Keeping previous cover art, {:?} unavailable: {}", wanted, e);
                next.failed = Some(wanted.clone());
            }
        }
        (next, None)
    }

    fn request_remote_artwork(&self, artwork: ArtworkRef) {
        let projector = self.clone();
        let requested = artwork.clone();
        self.loader.resolve_async(artwork, move |resolved| {
            projector.apply_remote_artwork(requested, resolved);
        });
    }

    fn apply_remote_artwork(&self, requested: ArtworkRef, resolved: Option<Artwork>) {
        let mut inner = self.lock();
        if !inner.machine.can_render() {
            log::debug!("Discarding cover art {:?}: notification no longer active", requested);
            return;
        }
        if inner.art.pending.as_ref() != Some(&requested) {
            log::debug!("Discarding superseded cover art {:?}", requested);
            return;
        }
        inner.art.pending = None;

        let Some(artwork) = resolved else {
            log::warn!("Keeping previous cover art, {:?} could not be loaded", requested);
            inner.art.failed = Some(requested);
            return;
        };

        let rendered =
            RenderedNotification::render(&inner.state, Some(artwork.clone()), &self.config);
        if let Err(e) = self.surface.notify(self.config.notification_id, &rendered) {
            log::error!("[NOTIFICATION] failed to render cover art: {}", e);
            return;
        }
        inner.art.current = Some(artwork);
        inner.art.source = Some(requested);
        inner.rendered = Some(rendered);
    }

    fn lock(&self) -> MutexGuard<'_, ProjectorInner> {
        lock_or_recover(&self.inner, "NotificationProjector")
    }
}

impl ProjectorInner {
    fn ensure_active(&self, operation: &str) -> Result<(), ProjectorError> {
        if self.machine.can_render() {
            Ok(())
        } else {
            let state = self.machine.current();
            log::error!("[NOTIFICATION] {} rejected: notification is {:?}", operation, state);
            Err(ProjectorError::NotActive(state))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceError;
    use crate::platform::{MockAssetSource, MockNotificationSurface};
    use crate::tests::test_helpers::test_config;

    fn projector_with(surface: MockNotificationSurface) -> NotificationProjector {
        projector_with_assets(surface, MockAssetSource::new())
    }

    fn projector_with_assets(
        surface: MockNotificationSurface,
        assets: MockAssetSource,
    ) -> NotificationProjector {
        let config = Arc::new(test_config());
        let loader = Arc::new(CoverArtLoader::new(Arc::new(assets), &config));
        NotificationProjector::new(Arc::new(surface), loader, config)
    }

    #[test]
    fn test_failed_setup_leaves_projector_uninitialized() {
        let mut surface = MockNotificationSurface::new();
        surface
            .expect_create_channel()
            .times(1)
            .returning(|_| Err(SurfaceError::ChannelUnavailable("blocked".to_string())));
        surface.expect_start_foreground().never();

        let projector = projector_with(surface);
        let err = projector.setup().unwrap_err();

        assert!(matches!(err, ProjectorError::Surface(_)));
        assert_eq!(projector.state(), ProjectorState::Uninitialized);
        assert!(projector.rendered().is_none());
    }

    #[test]
    fn test_setup_registers_channel_then_foreground() {
        let mut seq = mockall::Sequence::new();
        let mut surface = MockNotificationSurface::new();
        surface
            .expect_create_channel()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        surface
            .expect_start_foreground()
            .withf(|id, content| *id == 1 && content.title.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let projector = projector_with(surface);
        let handle = projector.setup().unwrap();

        assert_eq!(handle.id, 1);
        assert!(projector.is_active());
    }

    #[test]
    fn test_teardown_before_setup_touches_nothing() {
        let mut surface = MockNotificationSurface::new();
        surface.expect_cancel().never();
        surface.expect_stop_foreground().never();

        let projector = projector_with(surface);
        projector.teardown();
        projector.teardown();
        assert_eq!(projector.state(), ProjectorState::Uninitialized);
    }

    #[test]
    fn test_surface_rejection_is_reported() {
        let mut surface = MockNotificationSurface::new();
        surface.expect_create_channel().returning(|_| Ok(()));
        surface.expect_start_foreground().returning(|_, _| Ok(()));
        surface
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(SurfaceError::Rejected("quota".to_string())));

        let projector = projector_with(surface);
        projector.setup().unwrap();

        let before = projector.rendered();
        let err = projector
            .update(
                NotificationState::new("Song", true).with_artwork(ArtworkRef::Bundled(9)),
            )
            .unwrap_err();
        assert!(matches!(err, ProjectorError::Surface(SurfaceError::Rejected(_))));
        assert!(projector.is_active());
        assert_eq!(projector.current(), NotificationState::default());
        assert_eq!(projector.rendered(), before);
        assert_eq!(before, Some(RenderedNotification::blank(&test_config())));
    }

    #[test]
    fn test_unloadable_cover_is_not_reloaded_on_playback_updates() {
        let mut surface = MockNotificationSurface::new();
        surface.expect_create_channel().returning(|_| Ok(()));
        surface.expect_start_foreground().returning(|_, _| Ok(()));
        surface.expect_notify().times(3).returning(|_, _| Ok(()));
        let mut assets = MockAssetSource::new();
        assets.expect_open().times(1).returning(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
        });

        let projector = projector_with_assets(surface, assets);
        projector.setup().unwrap();
        projector
            .update(
                NotificationState::new("Song", true)
                    .with_artwork(ArtworkRef::BundledPath("covers/gone.png".to_string())),
            )
            .unwrap();
        projector.update_playback(false, "Song", None).unwrap();
        projector.update_playback(true, "Song", None).unwrap();

        assert!(projector.rendered().unwrap().artwork.is_none());
    }
}
