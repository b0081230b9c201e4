// Framework bootstrap for the headless game runtime.

use crate::domain::RoundState;
use crate::frameworks::autoplay::{AutoPlayer, AutoPlayerChannels, AutoPlayerSettings};
use crate::frameworks::config::{self, GameConfig};
use crate::interface_adapters::bridge::MapBridge;
use crate::interface_adapters::dataset::load_store_from_path;
use crate::interface_adapters::map_client::{
    MapClientSettings, MapClientState, MapView, map_client_task,
};
use crate::interface_adapters::utils::clock::SystemClock;
use crate::use_cases::{
    EngineEvent, LocationStore, Pacing, RoundSettings, SessionSettings, spawn_session,
};

use std::{io::Result, sync::Arc};
use tokio::sync::{mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Runs one full game against an in-process map client and the scripted player.
pub async fn run(config: GameConfig, store: Arc<LocationStore>) -> Result<RoundState> {
    let bridge = MapBridge::new(config.bridge_channel_capacity);

    let settings = SessionSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        event_broadcast_capacity: config::EVENT_BROADCAST_CAPACITY,
        round: RoundSettings {
            total_rounds: config.total_rounds,
            pack: config.pack.clone(),
            max_score: config.max_score,
            rng_seed: config.rng_seed,
        },
        pacing: Pacing {
            next_round_delay: config.next_round_delay,
            round_time_limit: config.round_time_limit,
        },
    };
    let session = spawn_session(settings, store.clone(), bridge.command_sink())
        .map_err(|e| std::io::Error::other(format!("failed to start session: {e}")))?;
    let endpoint = bridge.start(session.input_tx.clone());

    // Map client: the headless surface is ready as soon as it exists.
    let (ui_tx, ui_rx) = mpsc::channel(config::UI_CHANNEL_CAPACITY);
    let (view_tx, view_rx) = watch::channel(MapView::default());
    let client = tokio::spawn(map_client_task(
        MapClientState::new(SystemClock, config.floors),
        endpoint,
        ui_rx,
        view_tx,
        MapClientSettings {
            ready_attempts: config.map_ready_attempts,
            ready_interval: config.map_ready_interval,
        },
        || true,
    ));

    // Subscribe before the game starts so no round event is missed.
    let player = tokio::spawn(
        AutoPlayer::new(
            store,
            AutoPlayerChannels {
                events_rx: session.subscribe_events(),
                view_rx,
                ui_tx,
                input_tx: session.input_tx.clone(),
            },
            AutoPlayerSettings {
                jitter_meters: config.autoplay_jitter_meters,
                auto_advance: config.next_round_delay.is_some(),
                seed: config.rng_seed,
            },
        )
        .run(),
    );

    tracing::info!(
        rounds = config.total_rounds,
        pack = %config.pack,
        "starting game"
    );
    session
        .send(EngineEvent::StartGame)
        .await
        .map_err(std::io::Error::other)?;

    let final_state = session.wait_until_complete().await;
    session.shutdown();

    let player_total = player.await.map_err(std::io::Error::other)?;
    client
        .await
        .map_err(std::io::Error::other)?
        .inspect_err(|e| tracing::error!(error = %e, "map client failed"))
        .map_err(std::io::Error::other)?;

    tracing::info!(
        total_score = final_state.total_score,
        ?player_total,
        "game finished"
    );
    Ok(final_state)
}

pub async fn run_with_config() -> Result<RoundState> {
    init_runtime();

    let config = GameConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))
        .map_err(std::io::Error::other)?;

    let store = load_store_from_path(&config.dataset_path)
        .inspect_err(|e| {
            tracing::error!(
                path = %config.dataset_path.display(),
                error = %e,
                "failed to load dataset"
            );
        })
        .map_err(std::io::Error::other)?;

    run(config, Arc::new(store)).await
}
