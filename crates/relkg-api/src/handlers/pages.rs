//! Browser-facing pages

use crate::error::{ApiError, AppError};
use crate::handlers::{parse_mode, run_extraction};
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Form,
};
use relkg_graph::{GraphRenderer, GraphView, HtmlRenderer};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Input form page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Form submission from the index page
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessForm {
    /// Input text
    #[serde(default)]
    pub text: String,
    /// One of `short_text`, `long_text` or `wikipedia`
    pub option: String,
}

/// Extract triplets and render them as an interactive graph
#[utoipa::path(
    post,
    path = "/process",
    tag = "extraction",
    request_body(content = ProcessForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Rendered knowledge graph", body = String, content_type = "text/html"),
        (status = 400, description = "Unknown option", body = ApiError),
        (status = 502, description = "Tokenizer or generator failure", body = ApiError)
    )
)]
pub async fn process(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ProcessForm>,
) -> Result<impl IntoResponse, AppError> {
    let mode = parse_mode(Some(&form.option))?;
    let extraction = run_extraction(&state, &form.text, mode).await?;

    let kb = &extraction.knowledge_base;
    let view = GraphView::from_triplets(kb.triplets()).with_entities(kb.entities());
    let rendered = HtmlRenderer::default().render(&view)?;

    Ok(([(header::CONTENT_TYPE, rendered.content_type)], rendered.body))
}
