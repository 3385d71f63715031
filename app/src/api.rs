use std::sync::Arc;

use axum::extract::{Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use hand_rps_common::frame::encode_jpeg;
use hand_rps_common::gesture::Gesture;
use hand_rps_game::{BestOf, GameMode};
use image::RgbImage;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::assets::{GestureImages, Side};
use crate::commands::Command;
use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct ApiState {
    pub snapshots: watch::Receiver<Snapshot>,
    pub frames: watch::Receiver<Option<Arc<RgbImage>>>,
    pub commands: mpsc::Sender<Command>,
    pub images: Arc<GestureImages>,
    pub jpeg_quality: u8,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct StartGameBody {
    best_of: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ModeBody {
    mode: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /state
async fn get_state(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.snapshots.borrow().clone())
}

/// GET /frame.jpg, the last annotated frame
async fn get_frame(State(state): State<Arc<ApiState>>) -> Response {
    let Some(image) = state.frames.borrow().clone() else {
        return (StatusCode::NOT_FOUND, "no frame yet").into_response();
    };
    let quality = state.jpeg_quality;
    let result = tokio::task::spawn_blocking(move || encode_jpeg(&image, quality)).await;

    match result {
        Ok(Ok(jpeg)) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "preview encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "spawn_blocking failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /gestures/:side/:gesture, PNG icon or placeholder
async fn get_gesture(
    State(state): State<Arc<ApiState>>,
    AxumPath((side, gesture)): AxumPath<(String, String)>,
) -> Response {
    let side: Side = match side.parse() {
        Ok(s) => s,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{e}")).into_response(),
    };
    let gesture: Gesture = match gesture.parse() {
        Ok(g) => g,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{e}")).into_response(),
    };
    (
        [(header::CONTENT_TYPE, "image/png")],
        state.images.png(side, gesture),
    )
        .into_response()
}

/// POST /game, optional body { "best_of": 3 }
async fn start_game(
    State(state): State<Arc<ApiState>>,
    body: Option<Json<StartGameBody>>,
) -> Response {
    let best_of = match body.and_then(|Json(b)| b.best_of) {
        Some(n) => match BestOf::try_from(n) {
            Ok(b) => Some(b),
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        },
        None => None,
    };
    send(&state, Command::StartGame(best_of)).await
}

/// POST /round/confirm
async fn confirm_round(State(state): State<Arc<ApiState>>) -> Response {
    send(&state, Command::ConfirmRound).await
}

/// POST /round/skip
async fn skip_wait(State(state): State<Arc<ApiState>>) -> Response {
    send(&state, Command::SkipWait).await
}

/// PUT /mode, body { "mode": "always_win" }
async fn set_mode(State(state): State<Arc<ApiState>>, Json(body): Json<ModeBody>) -> Response {
    match body.mode.parse::<GameMode>() {
        Ok(mode) => send(&state, Command::SetMode(mode)).await,
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn send(state: &ApiState, command: Command) -> Response {
    match state.commands.send(command).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            warn!(error = %e, "game loop is gone, command dropped");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/frame.jpg", get(get_frame))
        .route("/gestures/:side/:gesture", get(get_gesture))
        .route("/game", post(start_game))
        .route("/round/confirm", post(confirm_round))
        .route("/round/skip", post(skip_wait))
        .route("/mode", put(set_mode))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
