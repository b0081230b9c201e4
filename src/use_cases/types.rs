// Use-case level inputs/outputs for the round engine.

use crate::domain::{ActualCoordinate, GuessCoordinate, LocationId};
use tokio::sync::mpsc;
use tracing::warn;

/// Inputs to the engine task. Player actions arrive from the UI or the map bridge; timer
/// events come from the scheduler and carry the round they were armed for.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StartGame,
    MapClicked(GuessCoordinate),
    SubmitGuess,
    // A guess submitted by the map client; `round` is absent for clients that do not tag it.
    RemoteGuess {
        guess: GuessCoordinate,
        round: Option<u32>,
    },
    NextRound,
    AbortGame,
    RoundTimeExpired { round: u32 },
    AutoAdvance { round: u32 },
}

/// Commands the engine issues to the map client.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    ShowMap,
    HideMap,
    SetActualLocation(ActualCoordinate),
    SetGuessingState { is_guessing: bool, round: u32 },
    UpdateScoreDisplay { score: u32, round: u32 },
    ClearMapState,
}

/// Named lifecycle notifications for UI observers.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    RoundStarted {
        round: u32,
        total_rounds: u32,
        location_id: LocationId,
    },
    ScoreUpdated {
        round: u32,
        round_score: u32,
        total_score: u32,
        // None when the round timed out without a pin.
        distance_m: Option<f64>,
    },
    RoundEnded {
        round: u32,
        round_score: u32,
    },
    GameEnded {
        total_score: u32,
        rounds_scored: u32,
    },
}

/// Port for fire-and-forget delivery of map commands.
pub trait MapCommandSink: Send {
    fn push(&mut self, command: MapCommand);
}

impl MapCommandSink for mpsc::Sender<MapCommand> {
    fn push(&mut self, command: MapCommand) {
        match self.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(command)) => {
                warn!(?command, "map command channel full; dropping command");
            }
            Err(mpsc::error::TrySendError::Closed(command)) => {
                warn!(?command, "map command channel closed; dropping command");
            }
        }
    }
}
