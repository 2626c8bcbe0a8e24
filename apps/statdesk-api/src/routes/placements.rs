//! # Placement Routes
//!
//! Placements are nested under their collector. Every write resyncs the
//! owning collector because placements travel inside its remote payload.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use statdesk_core::{Placement, PlacementDraft};
use statdesk_sync::{SyncOutcome, Synced};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/collectors/{id}/placements",
            get(list).post(create),
        )
        .route(
            "/api/collectors/{id}/placements/{placement_id}",
            get(fetch).put(update).delete(remove),
        )
}

/// Request body; the collector comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementBody {
    pub type_id: Uuid,
    #[serde(default)]
    pub supplier_ids: Vec<Uuid>,
    #[serde(default)]
    pub statistic_ids: Vec<Uuid>,
    #[serde(default)]
    pub copies: Vec<String>,
}

impl PlacementBody {
    fn into_draft(self, collector_id: Uuid, id: Option<Uuid>) -> PlacementDraft {
        PlacementDraft {
            id,
            collector_id,
            type_id: self.type_id,
            supplier_ids: self.supplier_ids,
            statistic_ids: self.statistic_ids,
            copies: self.copies,
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Path(collector_id): Path<Uuid>,
) -> Result<Json<Vec<Placement>>, ApiError> {
    let db = state.db();
    db.collectors().require(collector_id).await?;
    Ok(Json(db.placements().list_for_collector(collector_id).await?))
}

async fn create(
    State(state): State<AppState>,
    Path(collector_id): Path<Uuid>,
    ApiJson(body): ApiJson<PlacementBody>,
) -> Result<(StatusCode, Json<Synced<Placement>>), ApiError> {
    let draft = body.into_draft(collector_id, None);
    let saved = state.orchestrator.save_placement(&draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn fetch(
    State(state): State<AppState>,
    Path((collector_id, placement_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Placement>, ApiError> {
    Ok(Json(owned(&state, collector_id, placement_id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path((collector_id, placement_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<PlacementBody>,
) -> Result<Json<Synced<Placement>>, ApiError> {
    owned(&state, collector_id, placement_id).await?;
    let draft = body.into_draft(collector_id, Some(placement_id));
    Ok(Json(state.orchestrator.save_placement(&draft).await?))
}

async fn remove(
    State(state): State<AppState>,
    Path((collector_id, placement_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SyncOutcome>, ApiError> {
    owned(&state, collector_id, placement_id).await?;
    Ok(Json(state.orchestrator.delete_placement(placement_id).await?))
}

/// Loads a placement, treating one under another collector as missing.
async fn owned(state: &AppState, collector_id: Uuid, placement_id: Uuid) -> Result<Placement, ApiError> {
    let placement = state.db().placements().require(placement_id).await?;
    if placement.collector_id != collector_id {
        return Err(ApiError::not_found("Placement", &placement_id.to_string()));
    }
    Ok(placement)
}
