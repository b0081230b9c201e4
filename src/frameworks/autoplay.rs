// Scripted player for the headless binary: drives the map client the way a person would.

use crate::domain::{GeoPoint, Location};
use crate::interface_adapters::map_client::{ClientInput, MapView};
use crate::use_cases::{EngineEvent, LocationStore, RoundEvent};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

const METERS_PER_DEGREE: f64 = 111_000.0;

/// How the scripted player behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPlayerSettings {
    /// Maximum distance of the pin from the true location.
    pub jitter_meters: f64,
    /// The engine advances on its own timer; the player must not also send NextRound.
    pub auto_advance: bool,
    pub seed: Option<u64>,
}

/// Channels the player observes and drives.
pub struct AutoPlayerChannels {
    pub events_rx: broadcast::Receiver<RoundEvent>,
    pub view_rx: watch::Receiver<MapView>,
    pub ui_tx: mpsc::Sender<ClientInput>,
    pub input_tx: mpsc::Sender<EngineEvent>,
}

pub struct AutoPlayer {
    store: Arc<LocationStore>,
    events_rx: broadcast::Receiver<RoundEvent>,
    view_rx: watch::Receiver<MapView>,
    ui_tx: mpsc::Sender<ClientInput>,
    input_tx: mpsc::Sender<EngineEvent>,
    jitter_meters: f64,
    auto_advance: bool,
    rng: StdRng,
}

impl AutoPlayer {
    pub fn new(
        store: Arc<LocationStore>,
        channels: AutoPlayerChannels,
        settings: AutoPlayerSettings,
    ) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            events_rx: channels.events_rx,
            view_rx: channels.view_rx,
            ui_tx: channels.ui_tx,
            input_tx: channels.input_tx,
            jitter_meters: settings.jitter_meters,
            auto_advance: settings.auto_advance,
            rng,
        }
    }

    /// Plays until the game ends; returns the final total, or `None` if the engine went away.
    pub async fn run(mut self) -> Option<u32> {
        loop {
            let event = match self.events_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auto player lagged behind round events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            };

            match event {
                RoundEvent::RoundStarted {
                    round, location_id, ..
                } => {
                    let Some(location) = self.store.location(location_id).cloned() else {
                        warn!(%location_id, "round started with unknown location");
                        continue;
                    };
                    if !self.guess(round, &location).await {
                        return None;
                    }
                }
                RoundEvent::ScoreUpdated {
                    round,
                    round_score,
                    total_score,
                    distance_m,
                } => {
                    info!(round, round_score, total_score, ?distance_m, "round scored");
                    if self.auto_advance {
                        continue;
                    }
                    if self.input_tx.send(EngineEvent::NextRound).await.is_err() {
                        return None;
                    }
                }
                RoundEvent::RoundEnded { .. } => {}
                RoundEvent::GameEnded { total_score, .. } => return Some(total_score),
            }
        }
    }

    // Waits for the client to open guessing for `round`, then pins near the answer and submits.
    async fn guess(&mut self, round: u32, location: &Location) -> bool {
        let ready = self
            .view_rx
            .wait_for(|view| view.is_guessing && view.round == Some(round))
            .await
            .is_ok();
        if !ready {
            return false;
        }

        let point = jitter(location.point, self.jitter_meters, &mut self.rng);
        debug!(round, location = %location.id, ?point, "auto player guessing");

        for input in [
            ClientInput::SelectFloor(location.z_level),
            ClientInput::Click(point),
            ClientInput::Submit,
        ] {
            if self.ui_tx.send(input).await.is_err() {
                return false;
            }
        }
        true
    }
}

/// Offsets `point` by up to `meters` in a random direction.
pub fn jitter<R: Rng + ?Sized>(point: GeoPoint, meters: f64, rng: &mut R) -> GeoPoint {
    if meters <= 0.0 {
        return point;
    }
    let distance = rng.gen_range(0.0..=meters);
    let bearing = rng.gen_range(0.0..TAU);

    let lat_scale = point.latitude.to_radians().cos().abs().max(1e-6);
    let latitude = point.latitude + distance * bearing.sin() / METERS_PER_DEGREE;
    let longitude = point.longitude + distance * bearing.cos() / (METERS_PER_DEGREE * lat_scale);
    GeoPoint::new(latitude.clamp(-90.0, 90.0), longitude.clamp(-180.0, 180.0))
}
