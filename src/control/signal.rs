use crate::config::{ACTION_NEXT, ACTION_PLAY_PAUSE, ACTION_PREVIOUS, ACTION_STOP};

/// User intent raised by the OS from a notification or media button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSignal {
    Next,
    Previous,
    PlayPause,
    Stop,
}

impl ControlSignal {
    pub const ALL: [ControlSignal; 4] = [
        ControlSignal::Next,
        ControlSignal::Previous,
        ControlSignal::PlayPause,
        ControlSignal::Stop,
    ];

    /// Transport action identifier for this signal
    pub fn action(self) -> &'static str {
        match self {
            ControlSignal::Next => ACTION_NEXT,
            ControlSignal::Previous => ACTION_PREVIOUS,
            ControlSignal::PlayPause => ACTION_PLAY_PAUSE,
            ControlSignal::Stop => ACTION_STOP,
        }
    }

    pub fn from_action(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|signal| signal.action() == action)
    }

    /// Every action the control receiver subscribes to
    pub fn actions() -> [&'static str; 4] {
        Self::ALL.map(ControlSignal::action)
    }
}
