use std::fmt;

/// Lifecycle of the session's notification surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectorState {
    #[default]
    Uninitialized,
    Active,
    TornDown,
}

#[derive(Debug, Clone)]
pub struct StateTransitionError {
    from: ProjectorState,
    to: ProjectorState,
    message: String,
}

impl StateTransitionError {
    pub fn from_state(&self) -> ProjectorState {
        self.from
    }

    pub fn to_state(&self) -> ProjectorState {
        self.to
    }
}

impl fmt::Display for StateTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid notification transition from {:?} to {:?}: {}",
            self.from, self.to, self.message
        )
    }
}

impl std::error::Error for StateTransitionError {}

/// State machine for the notification surface with validation
#[derive(Debug, Default)]
pub struct ProjectorStateMachine {
    current_state: ProjectorState,
}

impl ProjectorStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: ProjectorState::Uninitialized,
        }
    }

    pub fn current(&self) -> ProjectorState {
        self.current_state
    }

    /// Validate and perform state transition
    pub fn transition_to(&mut self, new_state: ProjectorState) -> Result<(), StateTransitionError> {
        if self.is_valid_transition(self.current_state, new_state) {
            log::debug!(
                "[NOTIFICATION] transition {:?} -> {:?}",
                self.current_state,
                new_state
            );
            self.current_state = new_state;
            Ok(())
        } else {
            log::error!(
                "[NOTIFICATION] transition INVALID: {:?} -> {:?}",
                self.current_state,
                new_state
            );
            Err(StateTransitionError {
                from: self.current_state,
                to: new_state,
                message: match self.current_state {
                    ProjectorState::Active => "notification is already set up".to_string(),
                    ProjectorState::TornDown => "notification was torn down".to_string(),
                    ProjectorState::Uninitialized => "notification was never set up".to_string(),
                },
            })
        }
    }

    fn is_valid_transition(&self, from: ProjectorState, to: ProjectorState) -> bool {
        match (from, to) {
            (ProjectorState::Uninitialized, ProjectorState::Active) => true,
            (ProjectorState::Active, ProjectorState::TornDown) => true,

            // TornDown is terminal; setup happens once.
            _ => false,
        }
    }

    /// Whether the surface accepts render calls
    pub fn can_render(&self) -> bool {
        matches!(self.current_state, ProjectorState::Active)
    }

    /// Force set the current state without validation (use with caution)
    pub(crate) fn force_state(&mut self, state: ProjectorState) {
        log::warn!(
            "[NOTIFICATION] FORCE setting state from {:?} to {:?} (bypassing validation)",
            self.current_state,
            state
        );
        self.current_state = state;
    }
}
