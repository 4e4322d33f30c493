use serde::{Deserialize, Serialize};

use crate::artwork::{Artwork, ArtworkRef};
use crate::config::ServiceConfig;
use crate::control::ControlSignal;

/// Playback state pushed by the application.
///
/// Replaced wholesale on every update; fields are never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationState {
    pub title: String,
    pub artist: Option<String>,
    pub artwork: Option<ArtworkRef>,
    pub is_playing: bool,
}

impl NotificationState {
    pub fn new(title: impl Into<String>, is_playing: bool) -> Self {
        Self {
            title: title.into(),
            artist: None,
            artwork: None,
            is_playing,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_artwork(mut self, artwork: ArtworkRef) -> Self {
        self.artwork = Some(artwork);
        self
    }
}

/// Icon on the play/pause button, showing the action a tap performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIcon {
    Play,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationButton {
    pub signal: ControlSignal,
    /// Transport action raised when the button is tapped
    pub action: &'static str,
}

impl From<ControlSignal> for NotificationButton {
    fn from(signal: ControlSignal) -> Self {
        Self {
            signal,
            action: signal.action(),
        }
    }
}

/// Fully rendered notification content handed to the surface
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub channel_id: String,
    pub small_icon: String,
    pub title: String,
    pub artist: Option<String>,
    pub playback_icon: PlaybackIcon,
    pub artwork: Option<Artwork>,
    pub buttons: Vec<NotificationButton>,
    /// Host action for a tap on the notification body
    pub content_action: Option<String>,
    /// Ongoing notifications cannot be swiped away
    pub ongoing: bool,
    /// Tapping the body never dismisses the notification
    pub auto_cancel: bool,
}

impl RenderedNotification {
    /// The empty template shown while no track has been pushed yet.
    pub fn blank(config: &ServiceConfig) -> Self {
        Self::render(&NotificationState::default(), None, config)
    }

    pub fn render(
        state: &NotificationState,
        artwork: Option<Artwork>,
        config: &ServiceConfig,
    ) -> Self {
        let playback_icon = if state.is_playing {
            PlaybackIcon::Pause
        } else {
            PlaybackIcon::Play
        };

        Self {
            channel_id: config.channel.id.clone(),
            small_icon: config.small_icon.clone(),
            title: state.title.clone(),
            artist: state.artist.clone(),
            playback_icon,
            artwork,
            buttons: buttons(config),
            content_action: config.content_action.clone(),
            ongoing: true,
            auto_cancel: false,
        }
    }
}

fn buttons(config: &ServiceConfig) -> Vec<NotificationButton> {
    let mut signals = Vec::with_capacity(4);
    if config.show_previous_button {
        signals.push(ControlSignal::Previous);
    }
    signals.extend([ControlSignal::PlayPause, ControlSignal::Next, ControlSignal::Stop]);
    signals.into_iter().map(NotificationButton::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_pause_icon_reflects_state() {
        let config = ServiceConfig::default();
        let playing = RenderedNotification::render(&NotificationState::new("A", true), None, &config);
        let paused = RenderedNotification::render(&NotificationState::new("A", false), None, &config);

        assert_eq!(playing.playback_icon, PlaybackIcon::Pause);
        assert_eq!(paused.playback_icon, PlaybackIcon::Play);
    }

    #[test]
    fn test_missing_artist_clears_subtitle() {
        let config = ServiceConfig::default();
        let state = NotificationState::new("Title", true);
        let rendered = RenderedNotification::render(&state, None, &config);
        assert_eq!(rendered.artist, None);
        assert_eq!(rendered.title, "Title");
    }

    #[test]
    fn test_buttons_follow_config() {
        let mut config = ServiceConfig::default();
        let signals: Vec<_> = RenderedNotification::blank(&config)
            .buttons
            .iter()
            .map(|b| b.signal)
            .collect();
        assert_eq!(
            signals,
            vec![ControlSignal::PlayPause, ControlSignal::Next, ControlSignal::Stop]
        );

        config.show_previous_button = true;
        let rendered = RenderedNotification::blank(&config);
        assert_eq!(rendered.buttons[0].signal, ControlSignal::Previous);
        assert_eq!(rendered.buttons[0].action, ControlSignal::Previous.action());
        assert!(rendered.ongoing);
    }

    #[test]
    fn test_body_tap_opens_app_without_dismissing() {
        let mut config = ServiceConfig::default();
        let rendered = RenderedNotification::render(&NotificationState::new("A", true), None, &config);
        assert_eq!(rendered.content_action.as_deref(), Some(crate::config::ACTION_OPEN_APP));
        assert!(!rendered.auto_cancel);

        config.content_action = None;
        let inert = RenderedNotification::blank(&config);
        assert_eq!(inert.content_action, None);
        assert!(inert.ongoing);
    }
}
