//! State - dispatch セッションの状態機械

use serde::{Deserialize, Serialize};

/// Session state.
///
/// State transitions:
/// - Idle -> Running -> Drained
/// - Idle -> Drained (empty submission)
///
/// Drained is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Not yet submitted.
    Idle,

    /// Tasks in flight or results not yet delivered.
    Running,

    /// All results delivered, stream closed.
    Drained,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Drained)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Idle, SessionState::Running)
                | (SessionState::Idle, SessionState::Drained)
                | (SessionState::Running, SessionState::Drained)
        )
    }
}
