//! Per-speaker turn state.
//!
//! SILENT → SPEAKING on speech start, SPEAKING → SILENT on speech end.
//! The two speakers are tracked independently, so overlapping speech is fine.

use std::fmt;

use crate::transcript::Speaker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Silent,
    Speaking,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Silent => write!(f, "SILENT"),
            Self::Speaking => write!(f, "SPEAKING"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TurnTracker {
    agent: TurnState,
    user: TurnState,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, speaker: Speaker) -> &mut TurnState {
        match speaker {
            Speaker::Agent => &mut self.agent,
            Speaker::User => &mut self.user,
        }
    }

    pub fn state(&self, speaker: Speaker) -> TurnState {
        match speaker {
            Speaker::Agent => self.agent,
            Speaker::User => self.user,
        }
    }

    pub fn is_speaking(&self, speaker: Speaker) -> bool {
        self.state(speaker) == TurnState::Speaking
    }

    /// Returns the previous state.
    pub fn speech_started(&mut self, speaker: Speaker) -> TurnState {
        std::mem::replace(self.slot(speaker), TurnState::Speaking)
    }

    /// Returns the previous state.
    pub fn speech_ended(&mut self, speaker: Speaker) -> TurnState {
        std::mem::replace(self.slot(speaker), TurnState::Silent)
    }
}
