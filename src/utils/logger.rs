//! Structured logging utilities for the media session.
//!
//! Lifecycle transitions and network outcomes go through [`log_event`] so
//! that every line for the same kind of event carries the same shape. Plain
//! `log::debug!` is used everywhere else.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install `env_logger` as the `log` backend.
///
/// Honours `RUST_LOG`, defaulting to `info`. Safe to call more than once and
/// a no-op if the host already installed a logger.
pub fn init_logging() {
    INIT.call_once(|| {
        let result = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .format_timestamp_millis()
        .try_init();

        if let Err(e) = result {
            log::debug!("Logger already installed: {}", e);
        }
    });
}

#[derive(Debug, Clone, Serialize)]
pub enum LogEvent {
    Session {
        id: u64,
        phase: SessionPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<LogContext>,
    },
    Network {
        operation: String,
        status: NetworkStatus,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<NetworkDetails>,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum SessionPhase {
    BindRequested,
    Connected,
    Reused,
    Detached,
    Disconnected,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogContext {
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub enum NetworkStatus {
    Success,
    Timeout,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkDetails {
    pub endpoint: String,
    pub status_code: Option<u16>,
    pub bytes: Option<usize>,
}

pub fn log_event(event: LogEvent) {
    match event {
        LogEvent::Session { id, phase, context } => {
            let ctx_str = context
                .filter(|c| !c.fields.is_empty())
                .map(|c| format!(" | {:?}", c.fields))
                .unwrap_or_default();
            match phase {
                SessionPhase::Disconnected => {
                    log::warn!("🔌 SESSION #{} {:?} by host{}", id, phase, ctx_str);
                }
                _ => log::info!("🎵 SESSION #{} {:?}{}", id, phase, ctx_str),
            }
        }
        LogEvent::Network {
            operation,
            status,
            duration_ms,
            details,
        } => {
            let detail_str = details
                .map(|d| {
                    let mut s = format!(" | GET {}", d.endpoint);
                    if let Some(code) = d.status_code {
                        s.push_str(&format!(" -> {}", code));
                    }
                    if let Some(bytes) = d.bytes {
                        s.push_str(&format!(" ({}KB)", bytes / 1024));
                    }
                    s
                })
                .unwrap_or_default();
            match status {
                NetworkStatus::Success => {
                    log::info!("🌐 {} SUCCESS in {}ms{}", operation, duration_ms, detail_str);
                }
                NetworkStatus::Timeout => {
                    log::warn!("⏱️ {} TIMEOUT after {}ms{}", operation, duration_ms, detail_str);
                }
                NetworkStatus::Failed { error } => {
                    log::warn!("❌ {} FAILED: {}{}", operation, error, detail_str);
                }
            }
        }
    }
}

/// Shorthand for session lifecycle lines without extra context
pub fn log_session(id: u64, phase: SessionPhase) {
    log_event(LogEvent::Session {
        id,
        phase,
        context: None,
    });
}

/// Build a context map only when debug logging is enabled
#[macro_export]
macro_rules! log_context {
    ($($key:expr => $value:expr),* $(,)?) => {
        {
            if log::log_enabled!(log::Level::Debug) {
                let mut context = std::collections::HashMap::new();
                $(
                    context.insert($key.to_string(), $value.to_string());
                )*
                context
            } else {
                std::collections::HashMap::new()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("logger initialised twice without panicking");
    }

    #[test]
    fn test_log_context_macro() {
        let context = log_context! {
            "session" => 3,
            "listener" => "replaced",
        };

        if log::log_enabled!(log::Level::Debug) {
            assert_eq!(context.len(), 2);
            assert_eq!(context.get("session"), Some(&"3".to_string()));
        } else {
            assert!(context.is_empty());
        }
    }

    #[test]
    fn test_network_event_serializes() {
        let event = LogEvent::Network {
            operation: "artwork_fetch".to_string(),
            status: NetworkStatus::Failed {
                error: "dns".to_string(),
            },
            duration_ms: 12,
            details: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["Network"]["duration_ms"], 12);
        assert!(json["Network"].get("details").is_none());
        log_event(event);
    }
}
