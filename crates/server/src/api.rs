//! Board API endpoints.
//!
//! - POST /api/board/pieces - correlate two operations and score the board
//! - POST /api/board/pin    - manually correct one link's resolved pid
//! - GET  /api/health       - build version + timestamp
//!
//! Scoring is recomputed on every read, so a pin correction takes effect on
//! the next /pieces call without any re-scoring step of its own.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use gameboard_core::{build_exchanges, score_exchanges, Operation, ScoredExchange};

use crate::store::{OperationStore, StoreError};

// ============================================================================
// State & response envelope
// ============================================================================

#[derive(Clone)]
pub struct BoardApiState {
    pub store: Arc<RwLock<OperationStore>>,
}

impl BoardApiState {
    pub fn new(store: OperationStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn demo() -> Self {
        Self::new(OperationStore::demo())
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    fn err(msg: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        })
    }
}

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BoardRequest {
    /// Red operation id, if a red timeline should be loaded.
    pub red: Option<String>,
    /// Blue operation id.
    pub blue: Option<String>,
    /// Which side the viewer holds. Authentication is out of scope here, so
    /// this is caller-asserted; anything other than "blue" reports "red".
    pub access: Option<String>,
}

/// The fields of an operation the board reports back to the caller.
#[derive(Debug, Serialize)]
pub struct OperationSummary {
    pub id: String,
    pub name: String,
    pub state: String,
}

impl From<&Operation> for OperationSummary {
    fn from(op: &Operation) -> Self {
        Self {
            id: op.id.clone(),
            name: op.name.clone(),
            state: op.state.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_op: Option<OperationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blue_op: Option<OperationSummary>,
    /// Ordered (pid, exchange) pairs, in first-appearance order.
    pub exchanges: Vec<(u32, ScoredExchange)>,
    /// [red_total, blue_total]
    pub points: [i64; 2],
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub link_id: String,
    /// Accepted as raw JSON so a non-integer value can be rejected with a
    /// clear 400 instead of a generic deserialization failure.
    pub pin: serde_json::Value,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_board(
    State(state): State<BoardApiState>,
    Json(req): Json<BoardRequest>,
) -> impl IntoResponse {
    let store = state.store.read().unwrap();

    let red = req.red.as_deref().and_then(|id| store.get(id));
    let blue = req.blue.as_deref().and_then(|id| store.get(id));

    let exchanges = build_exchanges(red, blue, store.pin_overrides());
    let board = score_exchanges(red.is_some(), blue.is_some(), &exchanges);

    let access = match req.access.as_deref() {
        Some("blue") => "blue",
        _ => "red",
    };

    tracing::debug!(
        exchanges = board.exchanges.len(),
        red_points = board.points[0],
        blue_points = board.points[1],
        "board computed"
    );

    ApiResponse::ok(BoardResponse {
        access: access.to_string(),
        red_op: red.map(OperationSummary::from),
        blue_op: blue.map(OperationSummary::from),
        exchanges: board.exchanges,
        points: board.points,
    })
}

async fn set_pin(
    State(state): State<BoardApiState>,
    Json(req): Json<PinRequest>,
) -> impl IntoResponse {
    let pin = match req.pin.as_u64().and_then(|v| u32::try_from(v).ok()) {
        Some(pin) => pin,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                ApiResponse::<serde_json::Value>::err("pin must be a non-negative integer"),
            );
        }
    };

    let mut store = state.store.write().unwrap();
    match store.set_pin_override(&req.link_id, pin) {
        Ok(()) => {
            tracing::info!(link_id = %req.link_id, pin, "pin override recorded");
            (
                StatusCode::OK,
                ApiResponse::ok(serde_json::json!({ "updated": true })),
            )
        }
        Err(StoreError::UnknownLink(id)) => (
            StatusCode::NOT_FOUND,
            ApiResponse::err(&format!("unknown link: {}", id)),
        ),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "checked_at": chrono::Utc::now(),
    }))
}

// ============================================================================
// Router builder
// ============================================================================

pub fn board_api_router(state: BoardApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/board/pieces", post(get_board))
        .route("/api/board/pin", post(set_pin))
        .with_state(state)
}
