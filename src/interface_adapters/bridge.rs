// In-process message bridge between the round engine and the map client.
// Engine commands are serialized once into JSON text; client text is parsed at the boundary
// and anything that fails to parse is logged and dropped.

use crate::domain::GuessCoordinate;
use crate::interface_adapters::protocol::{EngineMessage, decode_client_message};
use crate::use_cases::{EngineEvent, MapCommand};

use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// The map client's half of the bridge.
#[derive(Debug)]
pub struct ClientEndpoint {
    /// Serialized engine messages, in the order the engine issued them.
    pub inbound_rx: mpsc::Receiver<String>,
    /// Raw JSON text the client sends to the engine.
    pub outbound_tx: mpsc::Sender<String>,
}

/// Channel wiring for one engine/client pair.
#[derive(Debug)]
pub struct MapBridge {
    capacity: usize,
    commands_tx: mpsc::Sender<MapCommand>,
    commands_rx: mpsc::Receiver<MapCommand>,
}

impl MapBridge {
    pub fn new(capacity: usize) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel::<MapCommand>(capacity);
        Self {
            capacity,
            commands_tx,
            commands_rx,
        }
    }

    /// Sender the round controller pushes map commands into.
    pub fn command_sink(&self) -> mpsc::Sender<MapCommand> {
        self.commands_tx.clone()
    }

    /// Spawns the serializer and the client pump, returning the client endpoint.
    pub fn start(self, input_tx: mpsc::Sender<EngineEvent>) -> ClientEndpoint {
        let (to_client_tx, to_client_rx) = mpsc::channel::<String>(self.capacity);
        let (from_client_tx, from_client_rx) = mpsc::channel::<String>(self.capacity);

        // Only the controller's sink should keep the command channel open.
        drop(self.commands_tx);
        tokio::spawn(map_command_serializer(self.commands_rx, to_client_tx));
        tokio::spawn(client_message_pump(from_client_rx, input_tx));

        ClientEndpoint {
            inbound_rx: to_client_rx,
            outbound_tx: from_client_tx,
        }
    }
}

pub async fn map_command_serializer(
    mut commands_rx: mpsc::Receiver<MapCommand>,
    client_tx: mpsc::Sender<String>,
) {
    let mut msgs_out: u64 = 0;
    let mut bytes_out: u64 = 0;

    while let Some(command) = commands_rx.recv().await {
        let msg = EngineMessage::from(command);
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!(error = ?e, "failed to serialize engine message");
                continue;
            }
        };

        let len = text.len() as u64;
        // Awaiting here preserves ordering; the engine itself never waits on the client.
        if client_tx.send(text).await.is_err() {
            warn!("map client disconnected; serializer exiting");
            break;
        }
        msgs_out += 1;
        bytes_out += len;
    }

    debug!(msgs_out, bytes_out, "map command serializer stopped");
}

pub async fn client_message_pump(
    mut client_rx: mpsc::Receiver<String>,
    input_tx: mpsc::Sender<EngineEvent>,
) {
    let mut msgs_in: u64 = 0;
    let mut invalid: u64 = 0;
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;
    let mut last_full_log = Instant::now() - LOG_THROTTLE;

    while let Some(text) = client_rx.recv().await {
        msgs_in += 1;

        let payload = match decode_client_message(&text) {
            Ok(payload) => payload,
            Err(e) => {
                invalid += 1;
                if should_log(&mut last_invalid_log) {
                    warn!(bytes = text.len(), error = %e, "failed to parse client message; dropping");
                }
                continue;
            }
        };

        let guess = match GuessCoordinate::try_from(&payload) {
            Ok(guess) => guess,
            Err(e) => {
                invalid += 1;
                if should_log(&mut last_invalid_log) {
                    warn!(error = %e, "invalid guess payload; dropping");
                }
                continue;
            }
        };

        debug!(
            round = payload.round,
            z_level = payload.z_level,
            z_level_name = %payload.z_level_name,
            "guess received from map client"
        );

        let event = EngineEvent::RemoteGuess {
            guess,
            round: payload.round,
        };
        match input_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_event)) => {
                if should_log(&mut last_full_log) {
                    warn!("engine input channel full; dropping guess");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_event)) => {
                info!("engine stopped; client pump exiting");
                break;
            }
        }
    }

    debug!(msgs_in, invalid, "client message pump stopped");
}
