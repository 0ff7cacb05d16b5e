//! Shared response envelope types for API handlers.
//!
//! Resource endpoints (selection, jobs) answer with a `{ "data": ... }`
//! envelope. The two action endpoints (`/extract-users`, `/send-mass-dm`)
//! answer with a `{ "status": ... }` body instead, which their clients
//! already expect.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: job }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
