// Domain-level errors for dataset loading, selection and the round lifecycle.

use std::path::PathBuf;

use crate::domain::location::{LocationId, PackId};
use crate::domain::round::RoundPhase;

/// Failures while loading the location dataset. All of them are fatal to game start.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("dataset not found at {}: {source}", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("dataset contains no locations")]
    NoLocations,
    #[error("duplicate location id {0}")]
    DuplicateLocation(LocationId),
    #[error("duplicate map pack id {0}")]
    DuplicatePack(PackId),
    #[error("location {id} has an invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        id: LocationId,
        latitude: f64,
        longitude: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("map pack {pack} resolves to no locations")]
    EmptyPack { pack: String },
}

/// Reasons a round operation was rejected. Rejections never change state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("total rounds must be at least 1")]
    NoRounds,
    #[error("max score {max_score} over {total_rounds} rounds overflows the running total")]
    ScoreCeilingTooHigh { max_score: u32, total_rounds: u32 },
    #[error("game already started (phase {0:?})")]
    AlreadyStarted(RoundPhase),
    #[error("not accepting guesses (phase {0:?})")]
    NotGuessing(RoundPhase),
    #[error("no guess has been placed")]
    NoGuess,
    #[error("no actual location for this round")]
    NoActual,
    #[error("round has not been scored yet (phase {0:?})")]
    NotSubmitted(RoundPhase),
    #[error("guess for round {received} arrived during round {current}")]
    StaleRound { current: u32, received: u32 },
    #[error("game is already complete")]
    GameOver,
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FloorError {
    #[error("floor {level} is outside [{min}, {max}]")]
    OutOfRange { level: i32, min: i32, max: i32 },
    #[error("floor bounds are inverted ({min} > {max})")]
    InvertedBounds { min: i32, max: i32 },
}
