//! Handler for `/send-mass-dm`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use herald_core::delay::DelayBounds;
use herald_core::job::JobRequest;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::session::OperatorSession;
use crate::state::AppState;

/// Request body for `POST /send-mass-dm`.
#[derive(Debug, Deserialize)]
pub struct SendMassDmRequest {
    /// Explicit recipients. When absent, the caller's session selection is used.
    pub usernames: Option<Vec<String>>,
    pub message: String,
    /// Seconds; defaults to the configured lower bound.
    pub min_delay: Option<f64>,
    /// Seconds; defaults to the configured upper bound.
    pub max_delay: Option<f64>,
    /// Recipient cap for this job, itself capped by configuration.
    pub max_dms: Option<usize>,
}

/// POST /api/v1/send-mass-dm
///
/// Validate the request and start a dispatch job. Returns 202 with
/// `{ "status": "started", "total", "job_id" }`; the job runs in the
/// background and reports over the WebSocket.
pub async fn send_mass_dm(
    session: Option<OperatorSession>,
    State(state): State<AppState>,
    Json(input): Json<SendMassDmRequest>,
) -> AppResult<impl IntoResponse> {
    let dispatch = &state.config.dispatch;

    let max_recipients = input
        .max_dms
        .map_or(dispatch.max_recipients_per_job, |m| {
            m.min(dispatch.max_recipients_per_job)
        });

    let recipients = match (input.usernames, &session) {
        (Some(usernames), _) => usernames,
        (None, Some(session)) => state
            .sessions
            .snapshot(&session.id)
            .await
            .recipients(max_recipients),
        (None, None) => Vec::new(),
    };

    let delay = DelayBounds::new(
        input.min_delay.unwrap_or(dispatch.default_min_delay_secs),
        input.max_delay.unwrap_or(dispatch.default_max_delay_secs),
    )?;

    let request = JobRequest::new(recipients, input.message, delay, max_recipients)?;
    let job = state.controller.submit(request).await?;

    tracing::info!(
        job_id = %job.id,
        total = job.total,
        session = session.as_ref().map(|s| s.id.as_str()),
        "Mass DM job started",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "started",
            "total": job.total,
            "job_id": job.id,
        })),
    ))
}
