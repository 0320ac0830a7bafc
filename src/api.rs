//! HTTP API endpoints.
//!
//! One JSON endpoint per game action plus the leaderboard. Domain errors map
//! onto status codes here; the bodies are `ErrorResponse` so a browser client
//! can show the message directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::game::{GameError, LifelineOutcome};
use crate::protocol::*;
use crate::state::{AppState, StateError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/game", get(get_game).delete(quit_game))
        .route("/api/game/start", post(start_game))
        .route("/api/game/answer", post(select_answer))
        .route("/api/game/advance", post(advance))
        .route("/api/game/lifeline", post(use_lifeline))
        .route("/api/game/score", post(save_score))
        .route("/api/leaderboard", get(leaderboard))
}

impl IntoResponse for StateError {
    fn into_response(self) -> Response {
        let status = match &self {
            StateError::Game(GameError::NoGame) => StatusCode::NOT_FOUND,
            StateError::Game(GameError::UnknownAnswer(_)) => StatusCode::BAD_REQUEST,
            StateError::Game(_) => StatusCode::CONFLICT,
            StateError::Questions(_) => StatusCode::BAD_GATEWAY,
            StateError::Leaderboard(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/game/start
///
/// Begins a new run; any previous game is discarded. A question-generation
/// failure is reported both here and in the game status, so the client can
/// offer "try again".
async fn start_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartGameRequest>,
) -> Result<Json<GameSnapshot>, StateError> {
    tracing::info!(mode = ?req.mode, category = %req.category, "Starting game");
    let snapshot = state.start_game(req.mode, req.category).await?;
    Ok(Json(snapshot))
}

/// GET /api/game
async fn get_game(State(state): State<Arc<AppState>>) -> Result<Json<GameSnapshot>, StateError> {
    match state.snapshot().await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(GameError::NoGame.into()),
    }
}

/// DELETE /api/game
async fn quit_game(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.quit_game().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// POST /api/game/answer
async fn select_answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<Json<GameSnapshot>, StateError> {
    let snapshot = state.select_answer(&req.answer).await?;
    Ok(Json(snapshot))
}

/// POST /api/game/advance
async fn advance(State(state): State<Arc<AppState>>) -> Result<Json<GameSnapshot>, StateError> {
    let snapshot = state.advance().await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Serialize)]
struct LifelineResponse {
    outcome: LifelineOutcome,
    game: GameSnapshot,
}

/// POST /api/game/lifeline
async fn use_lifeline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LifelineRequest>,
) -> Result<Json<LifelineResponse>, StateError> {
    let (outcome, game) = state.use_lifeline(req.lifeline).await?;
    Ok(Json(LifelineResponse { outcome, game }))
}

/// POST /api/game/score
///
/// Persists the finished run. A store failure surfaces here but the run
/// outcome itself is unaffected; the client still has the final score.
async fn save_score(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveScoreRequest>,
) -> Result<(StatusCode, Json<LeaderboardEntryView>), StateError> {
    let entry = state.save_score(req.name.trim()).await.map_err(|e| {
        tracing::error!("save_score failed: {}", e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /api/leaderboard
async fn leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LeaderboardResponse>, StateError> {
    let entries = state.leaderboard().await.map_err(|e| {
        tracing::error!("leaderboard fetch failed: {}", e);
        e
    })?;
    Ok(Json(LeaderboardResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}
