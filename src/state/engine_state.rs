//! Lifecycle states of the crawl engine

use std::fmt;

/// Represents where a crawl engine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Constructed, no tasks spawned yet
    Idle,

    /// Workers and collector are active
    Running,

    /// Job intake is closed; workers are finishing buffered and in-flight work
    Draining,

    /// Terminal: queues closed and every task joined
    Stopped,
}

impl EngineState {
    /// Checks if a transition from this state to another is valid
    ///
    /// # Valid Transitions
    ///
    /// - Idle -> Running (start)
    /// - Idle -> Stopped (stop before start)
    /// - Running -> Draining (stop closes intake)
    /// - Draining -> Stopped (all tasks joined)
    pub fn can_transition_to(&self, target: EngineState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Stopped)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Stopped)
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}
