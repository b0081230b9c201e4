// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use campus_guesser::domain::{GuessCoordinate, LocationId, PackSelector};
use campus_guesser::interface_adapters::dataset::load_store;
use campus_guesser::use_cases::{
    LocationStore, MapCommand, Pacing, RoundEvent, RoundSettings, SessionHandle, SessionSettings,
    spawn_session,
};
use tokio::sync::{broadcast, mpsc};

pub const DATASET: &str = r#"{
    "Locations": [
        { "ID": 1, "Name": "Great Court", "FileName": "court.jpg", "x": -27.4975, "y": 153.0130, "z": 1 },
        { "ID": 2, "Name": "Library", "FileName": "library.jpg", "x": -27.4962, "y": 153.0139, "z": 3 },
        { "ID": 3, "Name": "Car Park", "FileName": "p2.jpg", "x": -27.4959, "y": 153.0100, "z": -2 },
        { "ID": 10, "Name": "Riverside", "FileName": "river.jpg", "x": -27.4948, "y": 153.0165, "z": 1 },
        { "ID": 11, "Name": "Boat Shed", "FileName": "boat.jpg", "x": -27.4943, "y": 153.0172, "z": 0 }
    ],
    "MapPacks": [
        { "ID": 0, "Name": "all", "locationIDs": [] },
        { "ID": 1, "Name": "europe", "locationIDs": [10, 11] }
    ]
}"#;

pub fn store() -> Arc<LocationStore> {
    Arc::new(load_store(DATASET).expect("fixture dataset loads"))
}

pub fn settings(total_rounds: u32, pack: PackSelector, pacing: Pacing) -> SessionSettings {
    SessionSettings {
        input_channel_capacity: 64,
        event_broadcast_capacity: 64,
        round: RoundSettings {
            total_rounds,
            pack,
            max_score: 500,
            rng_seed: Some(7),
        },
        pacing,
    }
}

/// Spawns a session whose map commands are captured on a plain channel.
pub fn spawn(
    settings: SessionSettings,
    store: Arc<LocationStore>,
) -> (SessionHandle, mpsc::Receiver<MapCommand>) {
    let (commands_tx, commands_rx) = mpsc::channel(256);
    let handle = spawn_session(settings, store, commands_tx).expect("session starts");
    (handle, commands_rx)
}

pub async fn next_event(events_rx: &mut broadcast::Receiver<RoundEvent>) -> RoundEvent {
    tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
        .await
        .expect("round event in time")
        .expect("event channel open")
}

/// Waits for the next `RoundStarted` and returns its round and location.
pub async fn next_round_started(
    events_rx: &mut broadcast::Receiver<RoundEvent>,
) -> (u32, LocationId) {
    loop {
        if let RoundEvent::RoundStarted {
            round, location_id, ..
        } = next_event(events_rx).await
        {
            return (round, location_id);
        }
    }
}

pub async fn next_score(events_rx: &mut broadcast::Receiver<RoundEvent>) -> (u32, u32, u32) {
    loop {
        if let RoundEvent::ScoreUpdated {
            round,
            round_score,
            total_score,
            ..
        } = next_event(events_rx).await
        {
            return (round, round_score, total_score);
        }
    }
}

/// A guess placed exactly on `id`.
pub fn guess_on(store: &LocationStore, id: LocationId) -> GuessCoordinate {
    let location = store.location(id).expect("known location");
    GuessCoordinate {
        point: location.point,
        z_level: location.z_level,
        timestamp: 0,
    }
}
