// Client-side mirror of the round: markers, guess line and floor selector.
// The engine stays authoritative; this state only renders what the bridge tells it.

use crate::domain::ports::Clock;
use crate::domain::{FloorError, FloorTable, GeoPoint};
use crate::interface_adapters::bridge::ClientEndpoint;
use crate::interface_adapters::protocol::{
    ClientMessage, EngineMessage, ScoreDisplayPayload, SubmitGuessPayload,
};
use crate::interface_adapters::utils::ids::next_marker_id;

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const GROUND_FLOOR: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Guess,
    Actual,
}

impl MarkerStyle {
    /// Icon descriptor handed to the map surface.
    pub fn descriptor(self) -> &'static str {
        match self {
            MarkerStyle::Guess => "pin-guess",
            MarkerStyle::Actual => "pin-actual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerVisual {
    pub id: u64,
    pub point: GeoPoint,
    pub z_level: i32,
    pub style: MarkerStyle,
}

impl MarkerVisual {
    fn new(point: GeoPoint, z_level: i32, style: MarkerStyle) -> Self {
        Self {
            id: next_marker_id(),
            point,
            z_level,
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuessLine {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub dashed: bool,
}

/// Snapshot of everything the map surface should currently draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapView {
    pub visible: bool,
    pub is_guessing: bool,
    pub round: Option<u32>,
    pub floor: i32,
    pub floor_label: String,
    pub guess_marker: Option<MarkerVisual>,
    pub actual_marker: Option<MarkerVisual>,
    pub guess_line: Option<GuessLine>,
    pub score: Option<ScoreDisplayPayload>,
}

/// Local UI input for the map client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientInput {
    Click(GeoPoint),
    Submit,
    SelectFloor(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum MapClientError {
    #[error("map surface not ready after {attempts} attempts")]
    MapNotReady { attempts: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct MapClientSettings {
    pub ready_attempts: u32,
    pub ready_interval: Duration,
}

impl Default for MapClientSettings {
    fn default() -> Self {
        Self {
            ready_attempts: 50,
            ready_interval: Duration::from_millis(100),
        }
    }
}

pub struct MapClientState<C: Clock> {
    clock: C,
    floors: FloorTable,
    visible: bool,
    is_guessing: bool,
    round: Option<u32>,
    floor: i32,
    guess: Option<MarkerVisual>,
    // Epoch millis of the click that placed the current guess marker.
    pinned_at: u64,
    actual: Option<MarkerVisual>,
    line: Option<GuessLine>,
    score: Option<ScoreDisplayPayload>,
}

impl<C: Clock> MapClientState<C> {
    pub fn new(clock: C, floors: FloorTable) -> Self {
        let floor = if floors.contains(GROUND_FLOOR) {
            GROUND_FLOOR
        } else {
            floors.min()
        };
        Self {
            clock,
            floors,
            visible: false,
            is_guessing: false,
            round: None,
            floor,
            guess: None,
            pinned_at: 0,
            actual: None,
            line: None,
            score: None,
        }
    }

    pub fn is_guessing(&self) -> bool {
        self.is_guessing
    }

    pub fn floor(&self) -> i32 {
        self.floor
    }

    pub fn apply(&mut self, msg: EngineMessage) {
        match msg {
            EngineMessage::ShowMap => {
                if !self.visible {
                    self.visible = true;
                    debug!("map shown");
                }
            }
            EngineMessage::HideMap => {
                if self.visible {
                    self.visible = false;
                    debug!("map hidden");
                }
            }
            EngineMessage::SetActualLocation(payload) => {
                let point = GeoPoint::new(payload.latitude, payload.longitude);
                self.actual = Some(MarkerVisual::new(
                    point,
                    payload.z_level,
                    MarkerStyle::Actual,
                ));
            }
            EngineMessage::SetGuessingState(payload) => {
                self.is_guessing = payload.is_guessing;
                if payload.round.is_some() {
                    self.round = payload.round;
                }
            }
            EngineMessage::UpdateScoreDisplay(payload) => {
                self.score = Some(payload);
            }
            EngineMessage::ClearMapState => {
                self.guess = None;
                self.actual = None;
            }
        }
        self.refresh_guess_line();
    }

    /// Places or moves the guess marker. Returns false when the click was ignored.
    pub fn click(&mut self, point: GeoPoint) -> bool {
        if !self.is_guessing {
            debug!("click ignored while guessing is disabled");
            return false;
        }
        if !point.is_valid() {
            warn!(
                latitude = point.latitude,
                longitude = point.longitude,
                "click outside the map bounds ignored"
            );
            return false;
        }

        self.guess = Some(MarkerVisual::new(point, self.floor, MarkerStyle::Guess));
        self.pinned_at = self.clock.now_epoch_millis();
        self.refresh_guess_line();
        true
    }

    pub fn select_floor(&mut self, level: i32) -> Result<(), FloorError> {
        if let Err(e) = self.floors.label(level) {
            warn!(level, current = self.floor, error = %e, "floor selection rejected");
            return Err(e);
        }

        self.floor = level;
        // A pin placed this round follows the selector.
        if self.is_guessing {
            if let Some(guess) = self.guess.as_mut() {
                guess.z_level = level;
            }
        }
        Ok(())
    }

    /// Builds the guess payload for the engine, if a pin is placed and guessing is on.
    pub fn submit(&self) -> Option<SubmitGuessPayload> {
        if !self.is_guessing {
            debug!("submit ignored while guessing is disabled");
            return None;
        }
        let Some(guess) = self.guess else {
            debug!("submit ignored without a placed pin");
            return None;
        };

        let z_level_name = self
            .floors
            .label(guess.z_level)
            .unwrap_or_else(|_| guess.z_level.to_string());
        Some(SubmitGuessPayload {
            latitude: guess.point.latitude,
            longitude: guess.point.longitude,
            z_level: guess.z_level,
            z_level_name,
            timestamp: self.pinned_at,
            round: self.round,
        })
    }

    fn refresh_guess_line(&mut self) {
        self.line = match (self.is_guessing, self.actual, self.guess) {
            (false, Some(actual), Some(guess)) => Some(GuessLine {
                from: actual.point,
                to: guess.point,
                dashed: true,
            }),
            _ => None,
        };
    }

    pub fn view(&self) -> MapView {
        MapView {
            visible: self.visible,
            is_guessing: self.is_guessing,
            round: self.round,
            floor: self.floor,
            floor_label: self.floors.label(self.floor).unwrap_or_default(),
            guess_marker: self.guess,
            // The answer stays hidden until the round is scored.
            actual_marker: if self.is_guessing { None } else { self.actual },
            guess_line: self.line,
            score: self.score,
        }
    }
}

/// Polls the map surface until it reports ready.
pub async fn wait_for_map_ready<F>(
    mut probe: F,
    attempts: u32,
    interval: Duration,
) -> Result<(), MapClientError>
where
    F: FnMut() -> bool,
{
    for attempt in 1..=attempts {
        if probe() {
            debug!(attempt, "map surface ready");
            return Ok(());
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    error!(attempts, "map surface never became ready");
    Err(MapClientError::MapNotReady { attempts })
}

fn publish(view_tx: &watch::Sender<MapView>, view: MapView) {
    view_tx.send_if_modified(|current| {
        if *current == view {
            false
        } else {
            *current = view;
            true
        }
    });
}

pub async fn map_client_task<C, F>(
    mut state: MapClientState<C>,
    mut endpoint: ClientEndpoint,
    mut ui_rx: mpsc::Receiver<ClientInput>,
    view_tx: watch::Sender<MapView>,
    settings: MapClientSettings,
    probe: F,
) -> Result<(), MapClientError>
where
    C: Clock,
    F: FnMut() -> bool,
{
    wait_for_map_ready(probe, settings.ready_attempts, settings.ready_interval).await?;
    publish(&view_tx, state.view());

    loop {
        tokio::select! {
            inbound = endpoint.inbound_rx.recv() => {
                let Some(text) = inbound else {
                    info!("engine side of the bridge closed; map client exiting");
                    break;
                };
                match serde_json::from_str::<EngineMessage>(&text) {
                    Ok(msg) => state.apply(msg),
                    Err(e) => {
                        warn!(bytes = text.len(), error = %e, "failed to parse engine message; dropping");
                        continue;
                    }
                }
            }
            input = ui_rx.recv() => {
                let Some(input) = input else {
                    debug!("ui input closed; map client exiting");
                    break;
                };
                match input {
                    ClientInput::Click(point) => {
                        state.click(point);
                    }
                    ClientInput::SelectFloor(level) => {
                        let _ = state.select_floor(level);
                    }
                    ClientInput::Submit => {
                        let Some(payload) = state.submit() else {
                            continue;
                        };
                        let text = match serde_json::to_string(&ClientMessage::SubmitGuess(payload)) {
                            Ok(text) => text,
                            Err(e) => {
                                error!(error = ?e, "failed to serialize guess");
                                continue;
                            }
                        };
                        if endpoint.outbound_tx.send(text).await.is_err() {
                            info!("engine stopped accepting guesses; map client exiting");
                            break;
                        }
                    }
                }
            }
        }

        publish(&view_tx, state.view());
    }

    Ok(())
}
