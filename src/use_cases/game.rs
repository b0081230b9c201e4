use super::round::RoundController;
use super::scheduler::{CancellationToken, EventScheduler, ScheduledTask};
use super::types::{EngineEvent, MapCommandSink};
use crate::domain::{RoundPhase, RoundState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, info};

/// Optional timers applied to every round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    /// Advance automatically this long after results are shown.
    pub next_round_delay: Option<Duration>,
    /// Close the guessing window after this long.
    pub round_time_limit: Option<Duration>,
}

// Timer state for the round currently on screen.
struct RoundTimers {
    scheduler: EventScheduler,
    pacing: Pacing,
    token: CancellationToken,
    pending: Option<ScheduledTask>,
}

impl RoundTimers {
    fn new(scheduler: EventScheduler, pacing: Pacing) -> Self {
        Self {
            scheduler,
            pacing,
            token: CancellationToken::new(),
            pending: None,
        }
    }

    // Cancel whatever was armed for the previous phase and arm the timer for `state`.
    fn rearm(&mut self, state: &RoundState) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
        self.token.cancel();
        self.token = CancellationToken::new();

        let round = state.round_number;
        let armed = match state.phase {
            RoundPhase::Guessing => self
                .pacing
                .round_time_limit
                .map(|limit| (limit, EngineEvent::RoundTimeExpired { round })),
            RoundPhase::Submitted => self
                .pacing
                .next_round_delay
                .map(|delay| (delay, EngineEvent::AutoAdvance { round })),
            RoundPhase::Idle | RoundPhase::Complete => None,
        };

        if let Some((delay, event)) = armed {
            debug!(round, ?event, delay_ms = delay.as_millis(), "timer armed");
            self.pending = Some(self.scheduler.schedule(delay, event, self.token.clone()));
        }
    }
}

/// The single authoritative engine loop: applies events to the round controller in order and
/// publishes the resulting state.
pub async fn engine_task<S: MapCommandSink>(
    mut controller: RoundController<S>,
    mut input_rx: mpsc::Receiver<EngineEvent>,
    scheduler: EventScheduler,
    state_tx: watch::Sender<RoundState>,
    shutdown: Arc<Notify>,
    pacing: Pacing,
) {
    let mut timers = RoundTimers::new(scheduler, pacing);
    let _ = state_tx.send(controller.state().clone());

    loop {
        let event = tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the session is torn down.
                break;
            }
            event = input_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let before = (controller.phase(), controller.state().round_number);
        apply_event(&mut controller, event);
        let after = (controller.phase(), controller.state().round_number);

        if before != after {
            timers.rearm(controller.state());
        }

        // Rejected events leave the state untouched; only wake observers on real changes.
        state_tx.send_if_modified(|current| {
            if current == controller.state() {
                false
            } else {
                *current = controller.state().clone();
                true
            }
        });
    }

    timers.token.cancel();
    info!(
        total_score = controller.state().total_score,
        phase = ?controller.phase(),
        "engine stopped"
    );
}

// Rejections are already logged by the controller; the loop only routes events.
fn apply_event<S: MapCommandSink>(controller: &mut RoundController<S>, event: EngineEvent) {
    match event {
        EngineEvent::StartGame => {
            let _ = controller.start_game();
        }
        EngineEvent::MapClicked(guess) => {
            let _ = controller.on_map_clicked(guess);
        }
        EngineEvent::SubmitGuess => {
            let _ = controller.submit_guess();
        }
        EngineEvent::RemoteGuess { guess, round } => {
            let _ = controller.accept_remote_guess(guess, round);
        }
        EngineEvent::NextRound => {
            let _ = controller.next_round();
        }
        EngineEvent::AbortGame => {
            let _ = controller.abort_game();
        }
        EngineEvent::RoundTimeExpired { round } => {
            if is_current(controller, round, RoundPhase::Guessing) {
                let _ = controller.expire_round();
            } else {
                debug!(round, "stale round timer ignored");
            }
        }
        EngineEvent::AutoAdvance { round } => {
            if is_current(controller, round, RoundPhase::Submitted) {
                let _ = controller.next_round();
            } else {
                debug!(round, "stale auto-advance ignored");
            }
        }
    }
}

fn is_current<S: MapCommandSink>(
    controller: &RoundController<S>,
    round: u32,
    phase: RoundPhase,
) -> bool {
    controller.state().round_number == round && controller.phase() == phase
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn when_phase_changes_then_timer_for_previous_phase_never_fires() {
        let (input_tx, mut input_rx) = mpsc::channel(8);
        let mut timers = RoundTimers::new(
            EventScheduler::new(&input_tx),
            Pacing {
                next_round_delay: Some(Duration::from_millis(100)),
                round_time_limit: Some(Duration::from_secs(1)),
            },
        );

        let mut state = RoundState::new(2);
        state.phase = RoundPhase::Guessing;
        timers.rearm(&state);
        state.phase = RoundPhase::Submitted;
        timers.rearm(&state);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            input_rx.try_recv().ok(),
            Some(EngineEvent::AutoAdvance { round: 1 })
        );
        assert!(input_rx.try_recv().is_err());
    }
}
