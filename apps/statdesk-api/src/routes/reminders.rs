//! Reminder e-mails, sent by the statistics service to a collector's
//! suppliers. The service's status is the response status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/reminders", post(send))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub collector_id: Uuid,
    pub reminder_type: String,
}

async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReminderRequest>,
) -> Result<StatusCode, ApiError> {
    let reminder_type = request.reminder_type.trim();
    if reminder_type.is_empty() {
        return Err(ApiError::validation("reminderType is required"));
    }

    let status = state
        .orchestrator
        .send_reminder(request.collector_id, reminder_type)
        .await?;

    Ok(StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY))
}
