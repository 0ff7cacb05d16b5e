//! Extraction handoff: validate the request, ask the source, tidy the list.

use herald_core::error::CoreError;
use herald_core::extraction::{
    clamp_max_count, validate_target_username, ExtractionKind, ExtractionResult,
};
use herald_core::job::normalize_recipients;

use crate::sender::{RecipientSource, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Extract up to `requested` recipients (clamped to `cap`) from `source`.
///
/// The result is deduplicated and never longer than the clamped maximum,
/// even if the source returns more.
pub async fn extract_recipients(
    source: &dyn RecipientSource,
    target: &str,
    kind: ExtractionKind,
    requested: usize,
    cap: usize,
) -> Result<ExtractionResult, ExtractError> {
    let target = validate_target_username(target)?;
    let max_count = clamp_max_count(requested, cap);

    tracing::info!(account = target, %kind, max_count, "Extracting recipients");

    let mut recipients = normalize_recipients(source.fetch(target, kind, max_count).await?);
    recipients.truncate(max_count);

    tracing::info!(account = target, %kind, count = recipients.len(), "Extraction finished");

    Ok(ExtractionResult {
        kind,
        recipients,
        requested_max: max_count,
    })
}
