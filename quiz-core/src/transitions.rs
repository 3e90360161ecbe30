use quiz_types::{GamePhase, GameState, Ordinal};

use crate::SyncError;

/// Host actions that move the shared game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Start,
    Advance,
    ToggleReveal,
    ShowResults,
    Reset,
}

impl HostAction {
    pub fn name(&self) -> &'static str {
        match self {
            HostAction::Start => "start",
            HostAction::Advance => "advance",
            HostAction::ToggleReveal => "reveal",
            HostAction::ShowResults => "show results",
            HostAction::Reset => "reset",
        }
    }
}

pub fn next_index(current: Ordinal, total: u32) -> Result<Ordinal, SyncError> {
    if total == 0 {
        return Err(SyncError::EmptyCatalog);
    }
    Ok((current + 1) % total)
}

/// Computes the state after `action`. The version is carried over untouched;
/// the store assigns the next one when the write lands.
pub fn apply(state: &GameState, action: HostAction, total: u32) -> Result<GameState, SyncError> {
    let invalid = || SyncError::InvalidTransition {
        from: state.phase,
        action: action.name(),
    };

    match action {
        HostAction::Start => match state.phase {
            GamePhase::NotStarted => Ok(GameState {
                current_index: 0,
                started: true,
                phase: GamePhase::InProgress,
                version: state.version,
            }),
            _ => Err(invalid()),
        },
        HostAction::Advance => match state.phase {
            GamePhase::InProgress | GamePhase::Revealed => Ok(GameState {
                current_index: next_index(state.current_index, total)?,
                phase: GamePhase::InProgress,
                ..state.clone()
            }),
            _ => Err(invalid()),
        },
        HostAction::ToggleReveal => match state.phase {
            GamePhase::InProgress => Ok(GameState {
                phase: GamePhase::Revealed,
                ..state.clone()
            }),
            GamePhase::Revealed => Ok(GameState {
                phase: GamePhase::InProgress,
                ..state.clone()
            }),
            _ => Err(invalid()),
        },
        HostAction::ShowResults => match state.phase {
            GamePhase::InProgress | GamePhase::Revealed => Ok(GameState {
                phase: GamePhase::Results,
                ..state.clone()
            }),
            _ => Err(invalid()),
        },
        HostAction::Reset => Ok(GameState {
            current_index: 0,
            started: false,
            phase: GamePhase::NotStarted,
            version: state.version,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_progress(index: Ordinal) -> GameState {
        GameState {
            current_index: index,
            started: true,
            phase: GamePhase::InProgress,
            version: 4,
        }
    }

    #[test]
    fn test_next_index_wraps() {
        for total in 1..6 {
            for i in 0..total {
                assert_eq!(next_index(i, total).unwrap(), (i + 1) % total);
            }
        }
        assert!(matches!(next_index(0, 0), Err(SyncError::EmptyCatalog)));
    }

    #[test]
    fn test_start_only_from_not_started() {
        let started = apply(&GameState::default(), HostAction::Start, 3).unwrap();
        assert!(started.started);
        assert_eq!(started.phase, GamePhase::InProgress);
        assert_eq!(started.current_index, 0);

        assert!(matches!(
            apply(&started, HostAction::Start, 3),
            Err(SyncError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_advance_from_revealed_reopens_answers() {
        let revealed = apply(&in_progress(1), HostAction::ToggleReveal, 3).unwrap();
        assert_eq!(revealed.phase, GamePhase::Revealed);

        let next = apply(&revealed, HostAction::Advance, 3).unwrap();
        assert_eq!(next.current_index, 2);
        assert_eq!(next.phase, GamePhase::InProgress);
        assert_eq!(next.version, 4);
    }

    #[test]
    fn test_reveal_toggles_back() {
        let revealed = apply(&in_progress(0), HostAction::ToggleReveal, 3).unwrap();
        let hidden = apply(&revealed, HostAction::ToggleReveal, 3).unwrap();
        assert_eq!(hidden.phase, GamePhase::InProgress);
    }

    #[test]
    fn test_advance_requires_started_game() {
        assert!(matches!(
            apply(&GameState::default(), HostAction::Advance, 3),
            Err(SyncError::InvalidTransition { .. })
        ));

        let results = apply(&in_progress(2), HostAction::ShowResults, 3).unwrap();
        assert!(apply(&results, HostAction::Advance, 3).is_err());
        assert!(apply(&results, HostAction::ToggleReveal, 3).is_err());
    }

    #[test]
    fn test_reset_from_any_phase() {
        let results = apply(&in_progress(2), HostAction::ShowResults, 3).unwrap();
        let reset = apply(&results, HostAction::Reset, 3).unwrap();
        assert_eq!(reset.phase, GamePhase::NotStarted);
        assert_eq!(reset.current_index, 0);
        assert!(!reset.started);
    }
}
