// Session orchestration: wires a round controller to its engine task and channels.

use crate::domain::{RoundError, RoundState};
use crate::use_cases::game::{Pacing, engine_task};
use crate::use_cases::locations::LocationStore;
use crate::use_cases::round::{RoundController, RoundSettings};
use crate::use_cases::scheduler::EventScheduler;
use crate::use_cases::types::{EngineEvent, MapCommandSink, RoundEvent};
use std::sync::Arc;
use tokio::sync::{Notify, broadcast, mpsc, watch};

/// Configuration for spawning a game session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Capacity for inbound engine events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast round events.
    pub event_broadcast_capacity: usize,
    pub round: RoundSettings,
    pub pacing: Pacing,
}

/// Errors returned when talking to a running session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("engine task has stopped")]
    EngineClosed,
}

/// Channels for one running session.
#[derive(Clone)]
pub struct SessionHandle {
    /// Sender for events into the engine task.
    pub input_tx: mpsc::Sender<EngineEvent>,
    /// Broadcast sender for named round events.
    pub events_tx: broadcast::Sender<RoundEvent>,
    /// Watch sender holding the latest round state.
    pub state_tx: watch::Sender<RoundState>,
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    pub async fn send(&self, event: EngineEvent) -> Result<(), SessionError> {
        self.input_tx
            .send(event)
            .await
            .map_err(|_| SessionError::EngineClosed)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RoundEvent> {
        self.events_tx.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RoundState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> RoundState {
        self.state_tx.borrow().clone()
    }

    /// Waits until the game reaches its terminal phase and returns the final state.
    pub async fn wait_until_complete(&self) -> RoundState {
        let mut rx = self.state_tx.subscribe();
        // The handle keeps the sender alive, so `wait_for` can only end on a match.
        match rx.wait_for(RoundState::is_complete).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Stops the engine task; pending round timers are cancelled with it.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// Builds the round controller and spawns its engine task.
pub fn spawn_session<S>(
    settings: SessionSettings,
    store: Arc<LocationStore>,
    sink: S,
) -> Result<SessionHandle, RoundError>
where
    S: MapCommandSink + 'static,
{
    let (input_tx, input_rx) = mpsc::channel::<EngineEvent>(settings.input_channel_capacity);
    let (events_tx, _events_rx) =
        broadcast::channel::<RoundEvent>(settings.event_broadcast_capacity);

    let controller = RoundController::new(settings.round, store, sink, events_tx.clone())?;
    let (state_tx, _state_rx) = watch::channel::<RoundState>(controller.state().clone());
    let shutdown = Arc::new(Notify::new());

    // Spawn the authoritative engine loop for this session.
    tokio::spawn(engine_task(
        controller,
        input_rx,
        EventScheduler::new(&input_tx),
        state_tx.clone(),
        shutdown.clone(),
        settings.pacing,
    ));

    Ok(SessionHandle {
        input_tx,
        events_tx,
        state_tx,
        shutdown,
    })
}
