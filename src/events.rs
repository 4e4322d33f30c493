//! Application-facing event surface.

use crate::control::ControlSignal;
use crate::session::SessionHandle;

/// Events delivered to the single registered listener
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    Next,
    Previous,
    PlayPause,
    Stop,
    /// The listener now holds a live, connected session.
    Binder(SessionHandle),
}

impl ServiceEvent {
    /// The control signal this event was raised by, if any
    pub fn signal(&self) -> Option<ControlSignal> {
        match self {
            ServiceEvent::Next => Some(ControlSignal::Next),
            ServiceEvent::Previous => Some(ControlSignal::Previous),
            ServiceEvent::PlayPause => Some(ControlSignal::PlayPause),
            ServiceEvent::Stop => Some(ControlSignal::Stop),
            ServiceEvent::Binder(_) => None,
        }
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        match self {
            ServiceEvent::Binder(session) => Some(session),
            _ => None,
        }
    }
}

impl From<ControlSignal> for ServiceEvent {
    fn from(signal: ControlSignal) -> Self {
        match signal {
            ControlSignal::Next => ServiceEvent::Next,
            ControlSignal::Previous => ServiceEvent::Previous,
            ControlSignal::PlayPause => ServiceEvent::PlayPause,
            ControlSignal::Stop => ServiceEvent::Stop,
        }
    }
}

/// Consumer of control and binder events.
///
/// Implementations are called synchronously on the thread that raised the
/// event and must not block on a thread that may call `detach()`.
pub trait ServiceEvents: Send + Sync {
    fn on_event(&self, event: ServiceEvent);
}

impl<F> ServiceEvents for F
where
    F: Fn(ServiceEvent) + Send + Sync,
{
    fn on_event(&self, event: ServiceEvent) {
        self(event)
    }
}
