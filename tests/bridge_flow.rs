mod support;

use campus_guesser::domain::{FloorTable, PackSelector, RoundPhase};
use campus_guesser::frameworks::config::GameConfig;
use campus_guesser::interface_adapters::bridge::MapBridge;
use campus_guesser::interface_adapters::map_client::{
    ClientInput, MapClientSettings, MapClientState, MapView, map_client_task,
};
use campus_guesser::interface_adapters::protocol::ScoreDisplayPayload;
use campus_guesser::interface_adapters::utils::clock::SystemClock;
use campus_guesser::use_cases::{EngineEvent, Pacing, spawn_session};
use tokio::sync::{mpsc, watch};

#[tokio::test]
async fn when_client_guesses_over_the_bridge_then_view_reveals_the_answer() {
    let store = support::store();
    let bridge = MapBridge::new(32);
    let session = spawn_session(
        support::settings(2, PackSelector::All, Pacing::default()),
        store.clone(),
        bridge.command_sink(),
    )
    .expect("session starts");
    let endpoint = bridge.start(session.input_tx.clone());

    let (ui_tx, ui_rx) = mpsc::channel(16);
    let (view_tx, mut view_rx) = watch::channel(MapView::default());
    let client = tokio::spawn(map_client_task(
        MapClientState::new(SystemClock, FloorTable::default()),
        endpoint,
        ui_rx,
        view_tx,
        MapClientSettings::default(),
        || true,
    ));
    let mut events_rx = session.subscribe_events();

    session.send(EngineEvent::StartGame).await.expect("start");
    let (round, location_id) = support::next_round_started(&mut events_rx).await;
    let location = store.location(location_id).expect("location").clone();

    let view = view_rx
        .wait_for(|view| view.visible && view.is_guessing && view.round == Some(round))
        .await
        .expect("guessing view")
        .clone();
    assert!(view.actual_marker.is_none());

    for input in [
        ClientInput::SelectFloor(location.z_level),
        ClientInput::Click(location.point),
        ClientInput::Submit,
    ] {
        ui_tx.send(input).await.expect("ui input");
    }
    let (_, round_score, total_score) = support::next_score(&mut events_rx).await;
    assert_eq!(round_score, 500);
    assert_eq!(total_score, 500);

    let view = view_rx
        .wait_for(|view| view.score.is_some())
        .await
        .expect("scored view")
        .clone();
    assert!(!view.is_guessing);
    assert_eq!(
        view.score,
        Some(ScoreDisplayPayload {
            score: 500,
            round: 1
        })
    );
    assert_eq!(
        view.actual_marker.map(|marker| marker.point),
        Some(location.point)
    );
    let line = view.guess_line.expect("guess line");
    assert!(line.dashed);

    session.send(EngineEvent::NextRound).await.expect("next");
    let view = view_rx
        .wait_for(|view| view.is_guessing && view.round == Some(2))
        .await
        .expect("second round")
        .clone();
    assert!(view.guess_marker.is_none());
    assert!(view.guess_line.is_none());

    session.send(EngineEvent::AbortGame).await.expect("abort");
    let final_state = session.wait_until_complete().await;
    assert_eq!(final_state.phase, RoundPhase::Complete);
    assert_eq!(final_state.total_score, 500);
    view_rx
        .wait_for(|view| !view.visible)
        .await
        .expect("map hidden");

    session.shutdown();
    assert!(client.await.expect("client joins").is_ok());
}

#[tokio::test]
async fn when_headless_game_runs_with_exact_guesses_then_every_round_scores_full_marks() {
    let config = GameConfig {
        total_rounds: 3,
        rng_seed: Some(11),
        autoplay_jitter_meters: 0.0,
        ..GameConfig::default()
    };

    let final_state = campus_guesser::run(config, support::store())
        .await
        .expect("game runs");
    assert_eq!(final_state.phase, RoundPhase::Complete);
    assert_eq!(final_state.round_number, 3);
    assert_eq!(final_state.total_score, 1500);
}
