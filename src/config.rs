//! Configuration for the background media session.

use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigError;

/// Broadcast action raised by the "next" notification button
pub const ACTION_NEXT: &str = "audio_manager.action.NEXT";

/// Broadcast action raised by the "previous" notification button
pub const ACTION_PREVIOUS: &str = "audio_manager.action.PREVIOUS";

/// Broadcast action raised by the play/pause notification button
pub const ACTION_PLAY_PAUSE: &str = "audio_manager.action.PLAY_PAUSE";

/// Broadcast action raised by the stop notification button
pub const ACTION_STOP: &str = "audio_manager.action.STOP";

/// Action the host performs when the notification body is tapped: bring the
/// application's main surface to the front
pub const ACTION_OPEN_APP: &str = "audio_manager.action.OPEN_APP";

/// Default notification channel id
pub const DEFAULT_CHANNEL_ID: &str = "audio_manager.playback";

/// Default user-visible channel name
pub const DEFAULT_CHANNEL_NAME: &str = "Playback";

/// The single notification identity reused for the session's lifetime
pub const DEFAULT_NOTIFICATION_ID: i32 = 1;

/// Icon shown in the status bar
pub const DEFAULT_SMALL_ICON: &str = "ic_launcher";

/// Default timeout for remote cover art requests in milliseconds
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;

/// Environment variable overriding the remote fetch timeout
pub const FETCH_TIMEOUT_ENV: &str = "AUDIO_MANAGER_FETCH_TIMEOUT_MS";

/// How intrusive the OS should make the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Min,
    #[default]
    Low,
    Default,
    High,
}

/// Channel registration handed to the notification surface during setup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            id: DEFAULT_CHANNEL_ID.to_string(),
            name: DEFAULT_CHANNEL_NAME.to_string(),
            importance: Importance::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub channel: ChannelSpec,
    pub notification_id: i32,
    pub small_icon: String,
    /// The stock layout only carries next, play/pause and stop.
    pub show_previous_button: bool,
    /// Raised when the notification body is tapped. `None` makes the body inert.
    pub content_action: Option<String>,
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
    /// Route artwork requests through the system proxy settings
    pub use_system_proxy: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            channel: ChannelSpec::default(),
            notification_id: DEFAULT_NOTIFICATION_ID,
            small_icon: DEFAULT_SMALL_ICON.to_string(),
            show_previous_button: false,
            content_action: Some(ACTION_OPEN_APP.to_string()),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            user_agent: format!("audio-manager/{}", env!("CARGO_PKG_VERSION")),
            use_system_proxy: true,
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var(FETCH_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.fetch_timeout_ms = ms,
                _ => log::warn!("Ignoring invalid {}={:?}", FETCH_TIMEOUT_ENV, raw),
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.id.trim().is_empty() {
            return Err(ConfigError::Invalid("channel id must not be empty".into()));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid("fetch timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.notification_id, DEFAULT_NOTIFICATION_ID);
        assert_eq!(config.channel.importance, Importance::Low);
        assert!(!config.show_previous_button);
        assert_eq!(config.content_action.as_deref(), Some(ACTION_OPEN_APP));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ServiceConfig::from_json_str(
            r#"{ "channel": { "name": "Now playing", "importance": "high" }, "fetch_timeout_ms": 500 }"#,
        )
        .unwrap();

        assert_eq!(config.channel.id, DEFAULT_CHANNEL_ID);
        assert_eq!(config.channel.name, "Now playing");
        assert_eq!(config.channel.importance, Importance::High);
        assert_eq!(config.fetch_timeout(), Duration::from_millis(500));
        assert_eq!(config.small_icon, DEFAULT_SMALL_ICON);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            ServiceConfig::from_json_str(r#"{ "channel": { "id": " " } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServiceConfig::from_json_str(r#"{ "fetch_timeout_ms": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServiceConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_override_for_fetch_timeout() {
        std::env::set_var(FETCH_TIMEOUT_ENV, "2500");
        let config = ServiceConfig::default().with_env_overrides();
        assert_eq!(config.fetch_timeout_ms, 2500);

        std::env::set_var(FETCH_TIMEOUT_ENV, "soon");
        let config = ServiceConfig::default().with_env_overrides();
        assert_eq!(config.fetch_timeout_ms, DEFAULT_FETCH_TIMEOUT_MS);

        std::env::remove_var(FETCH_TIMEOUT_ENV);
    }

    #[test]
    fn test_content_action_can_be_disabled() {
        let config = ServiceConfig::from_json_str(r#"{ "content_action": null }"#).unwrap();
        assert_eq!(config.content_action, None);

        let config =
            ServiceConfig::from_json_str(r#"{ "content_action": "player.OPEN" }"#).unwrap();
        assert_eq!(config.content_action.as_deref(), Some("player.OPEN"));
    }
}
