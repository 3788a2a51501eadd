//! HTTP surface: the move and analysis endpoints.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::board::{Board, Color};
use crate::config::EngineConfig;
use crate::engine::EngineSession;
use crate::error::{EngineError, EngineResult};
use crate::gtp::{PositionAnalysis, Vertex};
use crate::rank;

#[derive(Clone)]
pub struct AppState {
    config: Arc<EngineConfig>,
    // Admission limit on concurrent engine processes
    sessions: Arc<Semaphore>,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub board: Vec<Vec<String>>,
    #[serde(default = "default_rank")]
    pub rank: String,
    /// Mover color; inferred from the stone counts when absent.
    #[serde(default)]
    pub color: Option<String>,
}

fn default_rank() -> String {
    "1k".to_string()
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub board: Vec<Vec<String>>,
}

#[derive(Serialize)]
pub struct MovePoint {
    pub x: usize,
    pub y: usize,
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub success: bool,
    /// The engine's move, or null for a pass
    #[serde(rename = "move")]
    pub point: Option<MovePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: Option<PositionAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(config: EngineConfig, max_sessions: usize) -> Router {
    let state = AppState {
        config: Arc::new(config),
        sessions: Arc::new(Semaphore::new(max_sessions)),
    };

    Router::new()
        .route("/api/move", post(generate_move))
        .route("/api/analyze", post(analyze_position))
        .with_state(state)
}

async fn generate_move(
    State(state): State<AppState>,
    Json(payload): Json<MoveRequest>,
) -> Json<MoveResponse> {
    let _permit = state
        .sessions
        .acquire()
        .await
        .expect("session semaphore closed");

    match run_move(&state, &payload).await {
        Ok(Vertex::Point { row, col }) => Json(MoveResponse {
            success: true,
            point: Some(MovePoint { x: col, y: row }),
            error: None,
        }),
        Ok(Vertex::Pass) => Json(MoveResponse {
            success: true,
            point: None,
            error: None,
        }),
        Err(err) => {
            warn!("move request failed: {err}");
            Json(MoveResponse {
                success: false,
                point: None,
                error: Some(err.to_string()),
            })
        }
    }
}

async fn run_move(state: &AppState, payload: &MoveRequest) -> EngineResult<Vertex> {
    let board = Board::from_grid(&payload.board);
    let color = match &payload.color {
        Some(label) => Color::from_label(label).ok_or_else(|| EngineError::Parse {
            message: format!("unknown color {label:?}"),
        })?,
        None => board.side_to_move(),
    };
    let playouts = rank::playouts_for_rank(&payload.rank);
    info!(
        "move requested: rank={} playouts={playouts} color={}",
        payload.rank,
        color.gtp_name()
    );

    let mut session = EngineSession::start(&state.config, playouts).await?;
    let result = async {
        session.replay_board(&board).await?;
        session.generate_move(color).await
    }
    .await;
    session.shutdown().await;
    result
}

async fn analyze_position(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Json<AnalyzeResponse> {
    let _permit = state
        .sessions
        .acquire()
        .await
        .expect("session semaphore closed");

    match run_analysis(&state, &payload).await {
        Ok(analysis) => Json(AnalyzeResponse {
            success: true,
            analysis: Some(analysis),
            error: None,
        }),
        Err(err) => {
            warn!("analysis request failed: {err}");
            Json(AnalyzeResponse {
                success: false,
                analysis: None,
                error: Some(err.to_string()),
            })
        }
    }
}

async fn run_analysis(
    state: &AppState,
    payload: &AnalyzeRequest,
) -> EngineResult<PositionAnalysis> {
    let board = Board::from_grid(&payload.board);
    info!("analysis requested");

    let mut session = EngineSession::start(&state.config, rank::DEFAULT_PLAYOUTS).await?;
    let result = async {
        session.replay_board(&board).await?;
        session.evaluate_position().await
    }
    .await;
    session.shutdown().await;
    result
}
