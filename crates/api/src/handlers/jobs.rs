//! Handlers for the `/jobs` resource.
//!
//! Only the job currently held by the controller (running or most recently
//! finished) is addressable; older ids are `404`.

use axum::extract::{Path, State};
use axum::Json;
use herald_core::job::{DispatchJob, JobStatus};
use herald_core::types::JobId;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for a cancel request.
#[derive(Debug, Serialize)]
pub struct CancelAck {
    pub job_id: JobId,
    /// Status observed when the request was accepted.
    pub status: JobStatus,
}

/// GET /api/v1/jobs/current
///
/// The held job, or `null` if none has been submitted yet.
pub async fn current_job(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<DispatchJob>>>> {
    let data = state.controller.current().await;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<Json<DataResponse<DispatchJob>>> {
    let data = state.controller.status(job_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/jobs/{id}/cancel
///
/// Request cooperative cancellation. The job stops before its next attempt;
/// a send already in flight completes first.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<Json<DataResponse<CancelAck>>> {
    let status = state.controller.cancel(job_id).await?;

    tracing::info!(%job_id, %status, "Job cancellation requested");

    Ok(Json(DataResponse {
        data: CancelAck { job_id, status },
    }))
}
