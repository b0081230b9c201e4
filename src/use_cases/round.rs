// Authoritative round lifecycle: Idle -> Guessing -> Submitted -> ... -> Complete.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::locations::LocationStore;
use super::types::{MapCommand, MapCommandSink, RoundEvent};
use crate::domain::{
    ActualCoordinate, GuessCoordinate, LocationId, PackSelector, RoundError, RoundPhase,
    RoundState, ScoringEngine,
};

/// Game-level settings fixed at construction.
#[derive(Debug, Clone)]
pub struct RoundSettings {
    pub total_rounds: u32,
    pub pack: PackSelector,
    pub max_score: u32,
    /// Fixed seed for reproducible location order; entropy when absent.
    pub rng_seed: Option<u64>,
}

/// Outcome of a scored round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundResult {
    pub round: u32,
    pub distance_m: Option<f64>,
    pub round_score: u32,
    pub total_score: u32,
}

pub struct RoundController<S> {
    store: Arc<LocationStore>,
    scoring: ScoringEngine,
    pack: PackSelector,
    rng: StdRng,
    sink: S,
    events_tx: broadcast::Sender<RoundEvent>,
    state: RoundState,
    actual: Option<ActualCoordinate>,
    guess: Option<GuessCoordinate>,
    location_id: Option<LocationId>,
    rounds_scored: u32,
}

impl<S: MapCommandSink> RoundController<S> {
    pub fn new(
        settings: RoundSettings,
        store: Arc<LocationStore>,
        sink: S,
        events_tx: broadcast::Sender<RoundEvent>,
    ) -> Result<Self, RoundError> {
        if settings.total_rounds == 0 {
            return Err(RoundError::NoRounds);
        }
        if settings
            .max_score
            .checked_mul(settings.total_rounds)
            .is_none()
        {
            return Err(RoundError::ScoreCeilingTooHigh {
                max_score: settings.max_score,
                total_rounds: settings.total_rounds,
            });
        }

        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            store,
            scoring: ScoringEngine::new(settings.max_score),
            pack: settings.pack,
            rng,
            sink,
            events_tx,
            state: RoundState::new(settings.total_rounds),
            actual: None,
            guess: None,
            location_id: None,
            rounds_scored: 0,
        })
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn guess(&self) -> Option<&GuessCoordinate> {
        self.guess.as_ref()
    }

    pub fn actual(&self) -> Option<&ActualCoordinate> {
        self.actual.as_ref()
    }

    pub fn current_location(&self) -> Option<LocationId> {
        self.location_id
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Idle -> Guessing for round 1.
    pub fn start_game(&mut self) -> Result<(), RoundError> {
        match self.state.phase {
            RoundPhase::Idle => {}
            RoundPhase::Complete => return Err(self.reject("start_game", RoundError::GameOver)),
            phase => {
                return Err(self.reject("start_game", RoundError::AlreadyStarted(phase)));
            }
        }

        let (location_id, actual) = self.pick_location()?;
        self.state.total_score = 0;
        self.rounds_scored = 0;
        info!(total_rounds = self.state.total_rounds, pack = %self.pack, "game started");
        self.sink.push(MapCommand::ShowMap);
        self.enter_round(1, location_id, actual);
        Ok(())
    }

    /// Records the player's pin; the latest click replaces any earlier one.
    pub fn on_map_clicked(&mut self, guess: GuessCoordinate) -> Result<(), RoundError> {
        if self.state.phase != RoundPhase::Guessing {
            return Err(self.reject("map_clicked", RoundError::NotGuessing(self.state.phase)));
        }
        self.guess = Some(guess);
        Ok(())
    }

    /// Guessing -> Submitted: scores the pinned guess against the actual location.
    pub fn submit_guess(&mut self) -> Result<RoundResult, RoundError> {
        if self.state.phase != RoundPhase::Guessing {
            return Err(self.reject("submit_guess", RoundError::NotGuessing(self.state.phase)));
        }
        let Some(actual) = self.actual else {
            return Err(self.reject("submit_guess", RoundError::NoActual));
        };
        let Some(guess) = self.guess else {
            return Err(self.reject("submit_guess", RoundError::NoGuess));
        };

        let distance = self.scoring.distance(&actual.point, &guess.point);
        let score = self.scoring.score(distance);
        Ok(self.finish_round(Some(distance), score))
    }

    /// A guess delivered over the map bridge: click and submit in one step.
    ///
    /// Guesses arriving outside the guessing window, or tagged with another round, are
    /// discarded rather than queued.
    pub fn accept_remote_guess(
        &mut self,
        guess: GuessCoordinate,
        round: Option<u32>,
    ) -> Result<RoundResult, RoundError> {
        if self.state.phase != RoundPhase::Guessing {
            return Err(self.reject("remote_guess", RoundError::NotGuessing(self.state.phase)));
        }
        match round {
            Some(received) if received != self.state.round_number => {
                return Err(self.reject(
                    "remote_guess",
                    RoundError::StaleRound {
                        current: self.state.round_number,
                        received,
                    },
                ));
            }
            _ => {}
        }

        self.on_map_clicked(guess)?;
        self.submit_guess()
    }

    /// Ends the guessing window when the round timer runs out.
    ///
    /// A pinned guess is scored normally; without one the round scores zero.
    pub fn expire_round(&mut self) -> Result<RoundResult, RoundError> {
        if self.state.phase != RoundPhase::Guessing {
            return Err(self.reject("expire_round", RoundError::NotGuessing(self.state.phase)));
        }
        if self.guess.is_some() {
            return self.submit_guess();
        }

        info!(round = self.state.round_number, "round timed out without a guess");
        Ok(self.finish_round(None, 0))
    }

    /// Submitted -> Guessing for the next round, or Complete after the last one.
    pub fn next_round(&mut self) -> Result<(), RoundError> {
        match self.state.phase {
            RoundPhase::Submitted => {}
            RoundPhase::Complete => return Err(self.reject("next_round", RoundError::GameOver)),
            phase => return Err(self.reject("next_round", RoundError::NotSubmitted(phase))),
        }

        if self.state.is_last_round() {
            self.end_round();
            self.complete();
            return Ok(());
        }

        let (location_id, actual) = self.pick_location()?;
        self.end_round();
        self.enter_round(self.state.round_number + 1, location_id, actual);
        Ok(())
    }

    /// Moves any non-terminal phase straight to Complete.
    pub fn abort_game(&mut self) -> Result<(), RoundError> {
        if self.state.is_complete() {
            return Err(self.reject("abort_game", RoundError::GameOver));
        }
        warn!(
            round = self.state.round_number,
            phase = ?self.state.phase,
            "game aborted"
        );
        self.complete();
        Ok(())
    }

    fn pick_location(&mut self) -> Result<(LocationId, ActualCoordinate), RoundError> {
        match self.store.select_random(&self.pack, &mut self.rng) {
            Ok(location) => Ok((location.id, location.actual_coordinate())),
            Err(err) => Err(self.reject("begin_round", err.into())),
        }
    }

    fn enter_round(&mut self, round: u32, location_id: LocationId, actual: ActualCoordinate) {
        self.state.round_number = round;
        self.state.round_score = 0;
        self.state.phase = RoundPhase::Guessing;
        self.guess = None;
        self.actual = Some(actual);
        self.location_id = Some(location_id);

        // The actual location must reach the client before guessing opens.
        self.sink.push(MapCommand::ClearMapState);
        self.sink.push(MapCommand::SetActualLocation(actual));
        self.sink.push(MapCommand::SetGuessingState {
            is_guessing: true,
            round,
        });

        info!(round, total_rounds = self.state.total_rounds, location_id = %location_id, "round started");
        let _ = self.events_tx.send(RoundEvent::RoundStarted {
            round,
            total_rounds: self.state.total_rounds,
            location_id,
        });
    }

    fn finish_round(&mut self, distance_m: Option<f64>, score: u32) -> RoundResult {
        let round = self.state.round_number;
        self.state.round_score = score;
        self.state.total_score = self.state.total_score.saturating_add(score);
        self.state.phase = RoundPhase::Submitted;
        self.rounds_scored += 1;

        self.sink.push(MapCommand::SetGuessingState {
            is_guessing: false,
            round,
        });
        self.sink.push(MapCommand::UpdateScoreDisplay {
            score: self.state.total_score,
            round,
        });

        info!(
            round,
            distance_m,
            round_score = score,
            total_score = self.state.total_score,
            "round scored"
        );
        let _ = self.events_tx.send(RoundEvent::ScoreUpdated {
            round,
            round_score: score,
            total_score: self.state.total_score,
            distance_m,
        });

        RoundResult {
            round,
            distance_m,
            round_score: score,
            total_score: self.state.total_score,
        }
    }

    fn end_round(&mut self) {
        self.guess = None;
        let _ = self.events_tx.send(RoundEvent::RoundEnded {
            round: self.state.round_number,
            round_score: self.state.round_score,
        });
    }

    fn complete(&mut self) {
        self.state.phase = RoundPhase::Complete;
        self.guess = None;
        self.actual = None;
        self.location_id = None;
        self.sink.push(MapCommand::HideMap);

        info!(
            total_score = self.state.total_score,
            rounds_scored = self.rounds_scored,
            "game complete"
        );
        let _ = self.events_tx.send(RoundEvent::GameEnded {
            total_score: self.state.total_score,
            rounds_scored: self.rounds_scored,
        });
    }

    fn reject(&self, operation: &'static str, err: RoundError) -> RoundError {
        warn!(
            operation,
            phase = ?self.state.phase,
            round = self.state.round_number,
            error = %err,
            "round operation rejected"
        );
        err
    }
}
