//! Resume Generation — orchestrates rendering, storage and metadata.
//!
//! Flow: (improve description) → render HTML → PDF API → blob upload or local
//!       file → metadata record (best-effort) → return outcome.
//!
//! Every step runs to completion before the next starts. Failures in the
//! primary path abort the operation. Metadata persistence and old-blob
//! deletion only ever produce warnings.

use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::identifiers::{blob_name, generate_code, is_valid_code, slugify};
use crate::models::resume::{PageSize, ResumeRecord, ResumeSummary};
use crate::models::section::ResumeInput;
use crate::render::render_document;
use crate::state::AppState;
use crate::storage::blob::strip_query;
use crate::storage::MetadataStore;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A successful result plus the best-effort steps that failed along the way.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    #[serde(flatten)]
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// A freshly generated and stored resume.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedResume {
    pub code: String,
    pub name_slug: String,
    /// Blob URL (access token included) or local file path.
    pub location: String,
    pub stored_remotely: bool,
    pub page_size: PageSize,
    pub created_at: String,
    pub description: String,
}

/// Result of replacing a resume with a newly generated one.
#[derive(Debug, Clone, Serialize)]
pub struct ReplacedResume {
    #[serde(flatten)]
    pub resume: GeneratedResume,
    pub previous_code: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Renders, stores and records one resume. Always produces a new code.
pub async fn generate_resume(
    state: &AppState,
    mut input: ResumeInput,
) -> Result<Outcome<GeneratedResume>, AppError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    if input.improve_description && !input.description.trim().is_empty() {
        info!("Improving description for {name}");
        input.description = state
            .improver
            .improve(&input.description, "description")
            .await?;
    }

    let html = render_document(&input);
    let pdf = state.renderer.render(&html, input.page_size).await?;

    let slug = slugify(&name);
    let code = generate_code();
    let object_name = blob_name(&slug, &code);

    let (location, stored_remotely) = match &state.blobs {
        Some(blobs) => (
            blobs.put_new(&object_name, PDF_CONTENT_TYPE, pdf).await?,
            true,
        ),
        None => (
            write_local(&state.config.output_dir, &object_name, &pdf).await?,
            false,
        ),
    };
    info!("Generated resume {code} for {name}");

    let blob_url = if stored_remotely { location.as_str() } else { "" };
    let record = ResumeRecord::new(
        &code,
        &name,
        &input.description,
        input.page_size,
        blob_url,
        Utc::now(),
    );

    let mut outcome = Outcome::new(GeneratedResume {
        code,
        name_slug: record.name_slug.clone(),
        location,
        stored_remotely,
        page_size: input.page_size,
        created_at: record.created_at.clone(),
        description: record.description.clone(),
    });

    if let Err(e) = persist_metadata(state, &record).await {
        outcome.warn(format!("failed to persist metadata: {e}"));
    }

    Ok(outcome)
}

/// Generates a replacement for `previous_code`, then deletes the previous blob.
///
/// The replacement stays current even when the deletion fails. The previous
/// metadata entry is not removed.
pub async fn update_resume(
    state: &AppState,
    previous_code: &str,
    input: ResumeInput,
) -> Result<Outcome<ReplacedResume>, AppError> {
    let previous = find_resume(state, previous_code).await?;

    let generated = generate_resume(state, input).await?;
    let mut outcome = Outcome {
        value: ReplacedResume {
            resume: generated.value,
            previous_code: previous.code.clone(),
        },
        warnings: generated.warnings,
    };

    match (previous.stored_blob(), &state.blobs) {
        (Some(url), Some(blobs)) => match blobs.delete(url).await {
            Ok(()) => info!("Replaced resume {} with {}", previous.code, outcome.value.resume.code),
            Err(e) => outcome.warn(format!(
                "failed to delete previous blob {}: {e}",
                strip_query(url)
            )),
        },
        (Some(url), None) => outcome.warn(format!(
            "previous blob {} was not deleted: no blob container is configured",
            strip_query(url)
        )),
        (None, _) => outcome.warn(format!(
            "previous resume {} has no stored blob to delete",
            previous.code
        )),
    }

    // TODO: decide whether replacing a resume should also delete its metadata entity.
    outcome.warn(format!(
        "metadata entry {} was kept and still references the previous blob",
        previous.code
    ));

    Ok(outcome)
}

/// Deletes the stored blob of `code`. Failures propagate.
pub async fn retire_resume(state: &AppState, code: &str) -> Result<ResumeSummary, AppError> {
    let record = find_resume(state, code).await?;

    let url = record.stored_blob().ok_or_else(|| {
        AppError::Validation(format!("resume {code} has no stored blob to delete"))
    })?;
    let blobs = state.blobs.as_ref().ok_or_else(|| {
        AppError::Config(
            "Required environment variable 'AZURE_CONTAINER_SAS_URL' is not set".to_string(),
        )
    })?;

    blobs.delete(url).await?;
    info!("Retired resume {code}");
    Ok(record)
}

/// Looks up one metadata record by code.
pub async fn find_resume(state: &AppState, code: &str) -> Result<ResumeSummary, AppError> {
    if !is_valid_code(code) {
        return Err(AppError::Validation(format!("invalid resume code '{code}'")));
    }

    metadata_store(state)?
        .get(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {code} not found")))
}

pub fn metadata_store(state: &AppState) -> Result<&dyn MetadataStore, AppError> {
    state.metadata.as_deref().ok_or_else(|| {
        AppError::Config(
            "AZURE_TABLE_SAS_URL and AZURE_TABLE_NAME must be set to look up resumes".to_string(),
        )
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Writes the table entity, then its JSON copy to the logs container.
/// Stops at the first failure.
async fn persist_metadata(state: &AppState, record: &ResumeRecord) -> Result<(), AppError> {
    if let Some(metadata) = &state.metadata {
        metadata.insert(record).await?;
    }

    if let Some(logs) = &state.logs {
        let body = serde_json::to_vec(record)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize record: {e}")))?;
        logs.put_new(
            &format!("{}.json", record.code),
            JSON_CONTENT_TYPE,
            Bytes::from(body),
        )
        .await?;
    }

    if state.metadata.is_none() && state.logs.is_none() {
        debug!("No metadata store configured; skipping record for {}", record.code);
    }
    Ok(())
}

async fn write_local(dir: &Path, file_name: &str, pdf: &[u8]) -> Result<String, AppError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, pdf).await?;
    info!("PDF saved to {}", path.display());
    Ok(path.display().to_string())
}
