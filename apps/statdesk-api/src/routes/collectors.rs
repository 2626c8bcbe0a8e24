//! # Collector Routes
//!
//! Writes go through the orchestrator so every save regenerates periods and
//! resyncs the remote mirror.
//!
//! ```text
//! POST /api/collectors             → 201 { ...collector, sync: {status, ...} }
//! PUT  /api/collectors/{id}        → 200 { ...collector, sync }
//! DELETE /api/collectors/{id}      → 204 (remote mirror removed first)
//! POST /api/collectors/{id}/sync   → 200 { status: linked|unlinked|failed }
//! GET  /api/collectors/{id}/export → 200 text/csv attachment
//!                  ?format=json    → 200 table with column widths
//! ```
//!
//! The download is plain CSV: it carries the rows and the title (as the
//! file name) but not the sheet name or column widths, which CSV cannot
//! express. Clients that build a styled sheet use `?format=json`, which
//! returns both.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use statdesk_core::export::SHEET_NAME;
use statdesk_core::{Collector, CollectorDraft, CollectorSnapshot, Period, StatsTable};
use statdesk_sync::{SyncOutcome, Synced};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/collectors", get(list).post(create))
        .route(
            "/api/collectors/{id}",
            get(fetch).put(update).delete(remove),
        )
        .route("/api/collectors/{id}/sync", post(sync))
        .route("/api/collectors/{id}/json", get(snapshot))
        .route("/api/collectors/{id}/periods", get(periods))
        .route("/api/collectors/{id}/export", get(export))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Collector>>, ApiError> {
    Ok(Json(state.db().collectors().list().await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(mut draft): ApiJson<CollectorDraft>,
) -> Result<(StatusCode, Json<Synced<Collector>>), ApiError> {
    draft.id = None;
    let saved = state.orchestrator.save_collector(&draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Collector>, ApiError> {
    Ok(Json(state.db().collectors().require(id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(mut draft): ApiJson<CollectorDraft>,
) -> Result<Json<Synced<Collector>>, ApiError> {
    draft.id = Some(id);
    Ok(Json(state.orchestrator.save_collector(&draft).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.orchestrator.delete_collector(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sync(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SyncOutcome>, ApiError> {
    Ok(Json(state.orchestrator.sync_collector(id).await?))
}

async fn snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CollectorSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.collector_snapshot(id).await?))
}

async fn periods(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Period>>, ApiError> {
    let db = state.db();
    db.collectors().require(id).await?;
    Ok(Json(db.periods().list_for_collector(id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub format: Option<String>,
}

/// JSON rendering of an export, for clients that build their own sheet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportView {
    pub sheet: &'static str,
    pub column_widths: Vec<f64>,
    #[serde(flatten)]
    pub table: StatsTable,
}

async fn export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let table = state.orchestrator.export_statistics(id).await?;

    match params.format.as_deref() {
        None | Some("csv") => {}
        Some("json") => {
            let view = ExportView {
                sheet: SHEET_NAME,
                column_widths: table.column_widths(),
                table,
            };
            return Ok(Json(view).into_response());
        }
        Some(other) => {
            return Err(ApiError::validation(format!("unknown export format '{other}'")));
        }
    }

    let body = table.to_csv()?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe(&table.file_name())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Replaces characters that cannot appear in a quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_file_name() {
        assert_eq!(header_safe("Spring 2024.csv"), "Spring 2024.csv");
        assert_eq!(header_safe("Wiosna \"łódź\".csv"), "Wiosna ___d__.csv");
    }
}
