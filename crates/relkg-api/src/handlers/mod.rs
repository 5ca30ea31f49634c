//! API handlers

pub mod extract;
pub mod health;
pub mod pages;

use relkg_extractor::{Extraction, ExtractionMode};

use crate::error::AppError;
use crate::state::AppState;

/// Parse a user-supplied mode name, rejecting unknown names as a bad request
pub(crate) fn parse_mode(name: Option<&str>) -> Result<ExtractionMode, AppError> {
    match name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Ok(name.parse()?),
        None => Ok(ExtractionMode::default()),
    }
}

/// Run one extraction and record it in the server counters
pub(crate) async fn run_extraction(
    state: &AppState,
    text: &str,
    mode: ExtractionMode,
) -> Result<Extraction, AppError> {
    let extraction = state.extractor.extract(text, mode).await?;
    state.record_extraction();

    tracing::info!(
        mode = %mode,
        chars = text.len(),
        triplets = extraction.knowledge_base.len(),
        "Request extraction finished"
    );
    Ok(extraction)
}
