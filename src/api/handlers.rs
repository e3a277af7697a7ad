//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{CandidateRecord, ConsumerRecord, ConsumersQuery, ErrorResponse, PanelResponse};
use crate::sizing::engine::Engine;

/// `GET /panel` → 200 + `PanelResponse` JSON
pub async fn get_panel(State(state): State<Arc<AppState>>) -> Json<PanelResponse> {
    Json(PanelResponse::from(&state.panel))
}

/// Returns consumer records in panel order.
///
/// `GET /consumers` → 200 + `Vec<ConsumerRecord>` JSON
/// `GET /consumers?room=Кухня` → only consumers in that room
pub async fn get_consumers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConsumersQuery>,
) -> Json<Vec<ConsumerRecord>> {
    let records = state
        .panel
        .consumers
        .iter()
        .enumerate()
        .filter(|(_, c)| query.room.as_deref().is_none_or(|room| c.room == room))
        .map(|(i, c)| ConsumerRecord::new(i, c))
        .collect();
    Json(records)
}

/// Returns the ranked device candidates for one consumer.
///
/// `GET /candidates/{index}` → 200 + `Vec<CandidateRecord>` JSON, empty when
/// nothing in the catalog complies
/// `GET /candidates/{index}` with an unknown index → 404 + `ErrorResponse`
/// `GET /candidates/{index}` for a consumer without a protection request or
/// computable current → 422 + `ErrorResponse`
pub async fn get_candidates(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<CandidateRecord>>, (StatusCode, Json<ErrorResponse>)> {
    if index >= state.panel.consumers.len() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!(
                    "no consumer at index {index} (panel has {})",
                    state.panel.consumers.len()
                ),
            }),
        ));
    }

    let engine = Engine::new(&state.catalog);
    let candidates = engine.candidates(&state.panel, index).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!(
                    "consumer {index} has no protection request or no computable current"
                ),
            }),
        )
    })?;

    Ok(Json(
        candidates.into_iter().map(CandidateRecord::from).collect(),
    ))
}
