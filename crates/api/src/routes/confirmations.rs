//! Event confirmation (RSVP) routes.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use domain::models::{ConfirmationKey, ConfirmationRecord, ConfirmationRequest, ConfirmationSummary};
use domain::services::summarize_confirmations;
use domain::DomainError;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_confirmation_write;
use crate::routes::DataResponse;

async fn require_guest(state: &AppState, guest_id: &str) -> Result<(), ApiError> {
    match state.guests.find_guest(guest_id).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::NotFound {
            entity: "guest",
            id: guest_id.to_string(),
        }
        .into()),
    }
}

fn write_result(err: &DomainError) -> &'static str {
    match err {
        DomainError::Conflict(_) => "conflict",
        DomainError::Validation(_) => "invalid",
        DomainError::Dependency(_) | DomainError::NotFound { .. } => "error",
    }
}

/// Reconcile and store a confirmation write.
///
/// PUT /api/v1/guests/:guest_id/events/:event_id/confirmation
///
/// Returns 409 with the current record's context when a decided answer is
/// written by a source other than the authoritative one.
pub async fn put_confirmation(
    State(state): State<AppState>,
    Path((guest_id, event_id)): Path<(String, String)>,
    Json(request): Json<ConfirmationRequest>,
) -> Result<Json<DataResponse<ConfirmationRecord>>, ApiError> {
    // Field rules first so every offending field is reported together.
    let checked = request
        .validate()
        .map_err(ApiError::from)
        .and_then(|()| state.reconciler.validate(&request).map_err(ApiError::from));
    if let Err(e) = checked {
        record_confirmation_write("invalid");
        return Err(e);
    }

    require_guest(&state, &guest_id).await?;

    let key = ConfirmationKey::new(guest_id, event_id);
    match state
        .confirmations
        .apply(&key, &request, state.reconciler.as_ref(), Utc::now())
        .await
    {
        Ok(record) => {
            record_confirmation_write("accepted");
            Ok(Json(DataResponse::new(record)))
        }
        Err(e) => {
            record_confirmation_write(write_result(&e));
            Err(e.into())
        }
    }
}

/// Get the confirmation of one guest for one event.
///
/// GET /api/v1/guests/:guest_id/events/:event_id/confirmation
pub async fn get_confirmation(
    State(state): State<AppState>,
    Path((guest_id, event_id)): Path<(String, String)>,
) -> Result<Json<DataResponse<ConfirmationRecord>>, ApiError> {
    let key = ConfirmationKey::new(guest_id, event_id);
    let record = state
        .confirmations
        .find(&key)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity: "confirmation",
            id: key.to_string(),
        })?;

    Ok(Json(DataResponse::new(record)))
}

/// List every confirmation of a guest.
///
/// GET /api/v1/guests/:guest_id/confirmations
pub async fn list_guest_confirmations(
    State(state): State<AppState>,
    Path(guest_id): Path<String>,
) -> Result<Json<DataResponse<Vec<ConfirmationRecord>>>, ApiError> {
    require_guest(&state, &guest_id).await?;
    let records = state.confirmations.list_by_guest(&guest_id).await?;
    Ok(Json(DataResponse::new(records)))
}

/// List every confirmation recorded for an event.
///
/// GET /api/v1/events/:event_id/confirmations
pub async fn list_event_confirmations(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<DataResponse<Vec<ConfirmationRecord>>>, ApiError> {
    let records = state.confirmations.list_by_event(&event_id).await?;
    Ok(Json(DataResponse::new(records)))
}

/// Dashboard counts for an event.
///
/// GET /api/v1/events/:event_id/confirmations/summary
pub async fn get_event_summary(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<DataResponse<ConfirmationSummary>>, ApiError> {
    let guests = state.guests.list_guests().await?;
    let records = state.confirmations.list_by_event(&event_id).await?;
    let summary = summarize_confirmations(&event_id, &guests, &records);
    Ok(Json(DataResponse::new(summary)))
}
