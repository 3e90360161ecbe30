use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Ordinal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GamePhase {
    #[default]
    NotStarted,
    InProgress,
    Revealed,
    Results,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::NotStarted => "not_started",
            GamePhase::InProgress => "in_progress",
            GamePhase::Revealed => "revealed",
            GamePhase::Results => "results",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(GamePhase::NotStarted),
            "in_progress" => Some(GamePhase::InProgress),
            "revealed" => Some(GamePhase::Revealed),
            "results" => Some(GamePhase::Results),
            _ => None,
        }
    }
}

/// The shared `game_state/current` document.
///
/// `version` increases by one on every successful write; writers must name
/// the version they read so concurrent hosts cannot silently overwrite each
/// other.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameState {
    pub current_index: Ordinal,
    pub started: bool,
    pub phase: GamePhase,
    pub version: u64,
}

impl GameState {
    pub fn is_accepting_answers(&self) -> bool {
        self.started && self.phase == GamePhase::InProgress
    }

    pub fn is_revealed(&self) -> bool {
        self.phase == GamePhase::Revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_string_round_trip() {
        for phase in [
            GamePhase::NotStarted,
            GamePhase::InProgress,
            GamePhase::Revealed,
            GamePhase::Results,
        ] {
            assert_eq!(GamePhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(GamePhase::parse("paused"), None);
    }

    #[test]
    fn test_default_state_is_not_started() {
        let state = GameState::default();
        assert_eq!(state.current_index, 0);
        assert!(!state.started);
        assert!(!state.is_accepting_answers());
    }
}
