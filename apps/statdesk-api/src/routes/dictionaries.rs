//! # Dictionary Routes
//!
//! Clients, statistics and placement types share one handler set; the kind
//! is attached to each router as an extension.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use statdesk_core::{DictionaryDraft, DictionaryEntry, DictionaryKind};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

/// URL segment for a dictionary kind.
pub const fn segment(kind: DictionaryKind) -> &'static str {
    match kind {
        DictionaryKind::Client => "clients",
        DictionaryKind::Statistic => "statistics",
        DictionaryKind::PlacementType => "placement-types",
    }
}

pub fn routes(kind: DictionaryKind) -> Router<AppState> {
    let base = format!("/api/{}", segment(kind));
    Router::new()
        .route(&base, get(list).post(create))
        .route(&format!("{base}/{{id}}"), get(fetch).put(update).delete(remove))
        .layer(Extension(kind))
}

/// `?active=true` limits a listing to selectable entries.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub active: bool,
}

async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<DictionaryKind>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DictionaryEntry>>, ApiError> {
    let repo = state.db().dictionary(kind);
    let entries = if params.active {
        repo.list_active().await?
    } else {
        repo.list().await?
    };
    Ok(Json(entries))
}

async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<DictionaryKind>,
    ApiJson(draft): ApiJson<DictionaryDraft>,
) -> Result<(StatusCode, Json<DictionaryEntry>), ApiError> {
    let entry = state.db().dictionary(kind).insert(&draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn fetch(
    State(state): State<AppState>,
    Extension(kind): Extension<DictionaryKind>,
    Path(id): Path<Uuid>,
) -> Result<Json<DictionaryEntry>, ApiError> {
    Ok(Json(state.db().dictionary(kind).require(id).await?))
}

async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<DictionaryKind>,
    Path(id): Path<Uuid>,
    ApiJson(draft): ApiJson<DictionaryDraft>,
) -> Result<Json<DictionaryEntry>, ApiError> {
    Ok(Json(state.db().dictionary(kind).update(id, &draft).await?))
}

async fn remove(
    State(state): State<AppState>,
    Extension(kind): Extension<DictionaryKind>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db().dictionary(kind).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
