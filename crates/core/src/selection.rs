//! Per-operator selection state.
//!
//! Holds the operator's last extraction and the recipients they picked from
//! it. One value lives per operator session; nothing here is global.

use serde::Serialize;

use crate::extraction::ExtractionResult;
use crate::job::normalize_recipients;

/// The last extraction plus the operator's ordered selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperatorSelection {
    extraction: Option<ExtractionResult>,
    selected: Vec<String>,
}

impl OperatorSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh extraction; the previous selection no longer applies.
    pub fn record_extraction(&mut self, extraction: ExtractionResult) {
        self.extraction = Some(extraction);
        self.selected.clear();
    }

    pub fn extraction(&self) -> Option<&ExtractionResult> {
        self.extraction.as_ref()
    }

    /// Add one recipient at the end of the selection.
    ///
    /// Returns `false` if it was already selected.
    pub fn select(&mut self, username: &str) -> bool {
        if self.selected.iter().any(|u| u == username) {
            return false;
        }
        self.selected.push(username.to_string());
        true
    }

    /// Remove one recipient. Returns `false` if it was not selected.
    pub fn deselect(&mut self, username: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|u| u != username);
        self.selected.len() != before
    }

    /// Select every extracted recipient, in extraction order.
    pub fn select_all(&mut self) -> usize {
        self.selected = self
            .extraction
            .as_ref()
            .map(|e| normalize_recipients(e.recipients.iter().cloned()))
            .unwrap_or_default();
        self.selected.len()
    }

    /// Replace the selection wholesale. Any subset and any order is fine.
    pub fn replace(&mut self, usernames: Vec<String>) -> usize {
        self.selected = normalize_recipients(usernames);
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// The first `max` selected recipients, in selection order.
    pub fn recipients(&self, max: usize) -> Vec<String> {
        self.selected.iter().take(max).cloned().collect()
    }
}
