//! Guest import and phone maintenance routes.

use axum::{extract::State, Json};
use domain::models::{ImportRequest, ImportResponse};
use domain::services::{renormalize_guest_phones, CsvIngestionPipeline, RenormalizationReport};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_import_outcome;
use crate::routes::DataResponse;

/// Import a batch of spreadsheet rows as guests.
///
/// POST /api/v1/guests/import
///
/// Rows are deduplicated by phone against the stored guests and against
/// each other. Per-row failures are reported in the outcome; only an
/// oversized batch or an unreachable store fails the request.
pub async fn import_guests(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let max_rows = state.config.limits.max_import_rows;
    if request.data.len() > max_rows {
        return Err(ApiError::validation(format!(
            "import batch has {} rows, the limit is {}",
            request.data.len(),
            max_rows
        )));
    }

    let existing = state.guests.list_guests().await?;
    let pipeline = CsvIngestionPipeline::new(state.canonicalizer.as_ref());
    let outcome = pipeline
        .ingest(request.data, &existing, state.guests.as_ref())
        .await;

    record_import_outcome(&outcome);

    Ok(Json(ImportResponse::from(outcome)))
}

/// Re-canonicalize every stored guest phone.
///
/// POST /api/v1/guests/phones/renormalize
pub async fn renormalize_phones(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<RenormalizationReport>>, ApiError> {
    let report =
        renormalize_guest_phones(state.guests.as_ref(), state.canonicalizer.as_ref()).await?;

    info!(
        total = report.total,
        updated = report.updated,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Guest phones renormalized"
    );

    Ok(Json(DataResponse::new(report)))
}
