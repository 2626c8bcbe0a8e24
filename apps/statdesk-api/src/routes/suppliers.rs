//! Supplier routes. Same shape as the other dictionaries plus `email`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use statdesk_core::{Supplier, SupplierDraft};
use uuid::Uuid;

use super::dictionaries::ListParams;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/suppliers", get(list).post(create))
        .route(
            "/api/suppliers/{id}",
            get(fetch).put(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Supplier>>, ApiError> {
    let repo = state.db().suppliers();
    let suppliers = if params.active {
        repo.list_active().await?
    } else {
        repo.list().await?
    };
    Ok(Json(suppliers))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<SupplierDraft>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    let supplier = state.db().suppliers().insert(&draft).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Supplier>, ApiError> {
    Ok(Json(state.db().suppliers().require(id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(draft): ApiJson<SupplierDraft>,
) -> Result<Json<Supplier>, ApiError> {
    Ok(Json(state.db().suppliers().update(id, &draft).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.db().suppliers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
