use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextImprover;
use crate::pdf_client::PdfRenderer;
use crate::storage::{BlobStore, MetadataStore};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external service sits behind a trait object. Optional services are
/// `None` when their configuration is absent.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub renderer: Arc<dyn PdfRenderer>,
    pub improver: Arc<dyn TextImprover>,
    /// PDF container. `None` means PDFs are written to `config.output_dir`.
    pub blobs: Option<Arc<dyn BlobStore>>,
    /// Container receiving a JSON copy of each metadata record.
    pub logs: Option<Arc<dyn BlobStore>>,
    pub metadata: Option<Arc<dyn MetadataStore>>,
}
