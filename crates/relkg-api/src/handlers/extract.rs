//! JSON extraction endpoint

use crate::error::{ApiError, AppError};
use crate::handlers::{parse_mode, run_extraction};
use crate::state::AppState;
use axum::{extract::State, Json};
use relkg_core::{Entity, Span, Triplet};
use relkg_extractor::{ExtractionMode, ExtractionStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Extraction request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtractRequest {
    /// Input text
    pub text: String,
    /// One of `short_text`, `long_text` or `wikipedia`; defaults to `long_text`
    #[serde(default)]
    pub mode: Option<String>,
}

/// Extraction result
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractResponse {
    #[schema(value_type = String)]
    pub mode: ExtractionMode,
    /// Deduplicated triplets in insertion order
    #[schema(value_type = Object)]
    pub triplets: Vec<Triplet>,
    /// Canonical entities (wikipedia mode only)
    #[schema(value_type = Object)]
    pub entities: Vec<Entity>,
    /// Token windows sent to the generator
    #[schema(value_type = Object)]
    pub windows: Vec<Span>,
    #[schema(value_type = Object)]
    pub stats: ExtractionStats,
}

/// Extract triplets from text
#[utoipa::path(
    post,
    path = "/api/v1/extract",
    tag = "extraction",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Extracted knowledge base", body = ExtractResponse),
        (status = 400, description = "Unknown mode", body = ApiError),
        (status = 502, description = "Tokenizer or generator failure", body = ApiError)
    )
)]
pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let mode = parse_mode(request.mode.as_deref())?;
    let extraction = run_extraction(&state, &request.text, mode).await?;

    let entities = extraction.knowledge_base.entities().values().cloned().collect();
    Ok(Json(ExtractResponse {
        mode,
        triplets: extraction.knowledge_base.into_triplets(),
        entities,
        windows: extraction.windows,
        stats: extraction.stats,
    }))
}
