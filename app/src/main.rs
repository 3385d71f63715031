mod api;
mod assets;
mod commands;
mod runner;
mod snapshot;
mod source;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hand_rps_common::config::Config;
use hand_rps_game::{BestOf, GameMode, GameSession, MonotonicClock, RandomPicker, RoundState};
use hand_rps_vision::HandRecognizer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::ApiState;
use crate::assets::GestureImages;
use crate::commands::Command;
use crate::runner::Runner;
use crate::source::CameraSource;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        source = config.camera.source,
        width = config.camera.width,
        height = config.camera.height,
        tick_ms = config.camera.tick_ms,
        "starting hand-rps"
    );

    let best_of = match BestOf::try_from(config.game.best_of) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "invalid game.best_of");
            std::process::exit(1);
        }
    };
    let mode = match config.game.mode.parse::<GameMode>() {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "invalid game.mode");
            std::process::exit(1);
        }
    };
    let picker = match config.game.seed {
        Some(seed) => RandomPicker::seeded(seed),
        None => RandomPicker::from_entropy(),
    };
    let session = GameSession::new(
        RoundState::new(best_of, mode, config.game.gesture_timeout_ms),
        MonotonicClock::new(),
        picker,
    );

    let source = match CameraSource::open(&config.camera) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to open camera source");
            std::process::exit(1);
        }
    };
    info!(kind = source.kind(), "camera source ready");

    let (command_tx, command_rx) = mpsc::channel(32);
    let (runner, presentation) = Runner::new(
        source,
        HandRecognizer::new(&config),
        session,
        (config.camera.width, config.camera.height),
        command_rx,
    );

    if config.presentation.console {
        tokio::spawn(read_console(command_tx.clone()));
        info!(
            "console commands: start [1|3|5], confirm, skip, \
             mode <normal|always_win|always_lose>, quit"
        );
    }

    if config.api.enabled {
        let images = GestureImages::load(
            Path::new(&config.presentation.player_images_dir),
            Path::new(&config.presentation.computer_images_dir),
        );
        let state = Arc::new(ApiState {
            snapshots: presentation.snapshots.clone(),
            frames: presentation.frames.clone(),
            commands: command_tx.clone(),
            images: Arc::new(images),
            jpeg_quality: config.presentation.jpeg_quality,
        });

        let addr = format!("0.0.0.0:{}", config.api.port);
        let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
            eprintln!("Failed to bind to {addr}: {e}");
            std::process::exit(1);
        });
        info!(addr, "HTTP API listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, api::router(state)).await {
                error!(error = %e, "HTTP API server stopped");
            }
        });
    }
    drop(command_tx);

    let period = Duration::from_millis(config.camera.tick_ms.max(1));
    runner.run(period).await;
}

/// Forward console lines to the game loop until stdin closes.
async fn read_console(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(cmd) => {
                        if tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, input = line, "ignoring console input"),
                }
            }
            Ok(None) => {
                debug!("stdin closed, console commands disabled");
                break;
            }
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}
