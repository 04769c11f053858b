//! Axum route handlers for the Resume API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::{
    find_resume, generate_resume, retire_resume, update_resume, GeneratedResume, Outcome,
    ReplacedResume,
};
use crate::generation::input::resume_input_from_value;
use crate::models::resume::ResumeSummary;
use crate::render::render_document;
use crate::state::AppState;
use crate::storage::blob::strip_query;
use crate::storage::list_resumes;
use crate::storage::table::DEFAULT_PAGE_SIZE;

/// Largest page the table service returns.
const MAX_PAGE_SIZE: u32 = 1000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page_size: Option<u32>,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub resumes: Vec<ResumeSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub text: String,
    pub property: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImproveResponse {
    pub improved: String,
}

#[derive(Debug, Serialize)]
pub struct RetireResponse {
    pub code: String,
    pub deleted_blob: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Renders the resume, stores the PDF and records its metadata.
/// Metadata failures come back as warnings alongside a 201.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Outcome<GeneratedResume>>), AppError> {
    let input = resume_input_from_value(body)?;
    let outcome = generate_resume(&state, input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    if params.max_pages == Some(0) {
        return Err(AppError::Validation(
            "max_pages must be at least 1".to_string(),
        ));
    }

    let Some(metadata) = state.metadata.as_deref() else {
        info!("No metadata table configured; returning an empty listing");
        return Ok(Json(ListResponse {
            count: 0,
            resumes: Vec::new(),
        }));
    };

    let resumes = list_resumes(metadata, page_size, params.max_pages).await?;
    Ok(Json(ListResponse {
        count: resumes.len(),
        resumes,
    }))
}

/// GET /api/v1/resumes/:code
pub async fn handle_get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ResumeSummary>, AppError> {
    Ok(Json(find_resume(&state, &code).await?))
}

/// PUT /api/v1/resumes/:code
///
/// Generates a replacement under a new code and deletes the old blob.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Outcome<ReplacedResume>>, AppError> {
    let input = resume_input_from_value(body)?;
    Ok(Json(update_resume(&state, &code, input).await?))
}

/// DELETE /api/v1/resumes/:code
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RetireResponse>, AppError> {
    let retired = retire_resume(&state, &code).await?;
    Ok(Json(RetireResponse {
        deleted_blob: retired
            .stored_blob()
            .map(|url| strip_query(url).to_string())
            .unwrap_or_default(),
        code: retired.code,
    }))
}

/// POST /api/v1/resumes/preview
///
/// Returns the HTML document that would be sent to the renderer. No network calls.
pub async fn handle_preview(Json(body): Json<Value>) -> Result<Html<String>, AppError> {
    let input = resume_input_from_value(body)?;
    Ok(Html(render_document(&input)))
}

/// POST /api/v1/resumes/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    let property = request
        .property
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("description");

    let improved = state.improver.improve(&request.text, property).await?;
    Ok(Json(ImproveResponse { improved }))
}
