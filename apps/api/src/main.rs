mod config;
mod errors;
mod generation;
mod identifiers;
mod llm_client;
mod models;
mod pdf_client;
mod render;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::input::parse_resume_input;
use crate::llm_client::LlmClient;
use crate::pdf_client::NutrientClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::sas::SasUrl;
use crate::storage::{BlobClient, BlobStore, MetadataStore, TableClient};

const PDF_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const LOG_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("render") {
        std::process::exit(render_offline(&args).await);
    }

    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    let state = build_state(config.clone())?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds every client once. Malformed SAS URLs fail here, before any request.
fn build_state(config: Config) -> Result<AppState> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("resume-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let blobs: Option<Arc<dyn BlobStore>> = match config.container_sas_url.as_deref() {
        Some(url) => {
            let container = SasUrl::parse(url, "AZURE_CONTAINER_SAS_URL")?;
            info!("PDFs will be uploaded to blob storage");
            Some(Arc::new(BlobClient::new(
                client.clone(),
                container,
                PDF_UPLOAD_TIMEOUT,
            )))
        }
        None => {
            info!("PDFs will be written to {}", config.output_dir.display());
            None
        }
    };

    let logs: Option<Arc<dyn BlobStore>> = match config.logs_container_sas_url.as_deref() {
        Some(url) => Some(Arc::new(BlobClient::new(
            client.clone(),
            SasUrl::parse(url, "AZURE_LOGS_CONTAINER_SAS_URL")?,
            LOG_UPLOAD_TIMEOUT,
        ))),
        None => None,
    };

    let metadata: Option<Arc<dyn MetadataStore>> = match config.table_settings() {
        Some((url, table_name)) => {
            info!("Metadata table: {table_name}");
            Some(Arc::new(TableClient::new(client.clone(), url, table_name)?))
        }
        None => None,
    };

    Ok(AppState {
        renderer: Arc::new(NutrientClient::new(
            client.clone(),
            config.nutrient_api_key.clone(),
        )),
        improver: Arc::new(LlmClient::new(client, config.openai_api_key.clone())),
        blobs,
        logs,
        metadata,
        config,
    })
}

/// `resume-api render <input.json>`: prints the HTML document.
async fn render_offline(args: &[String]) -> i32 {
    match render_file(args.get(2).map(String::as_str)).await {
        Ok(html) => {
            println!("{html}");
            0
        }
        Err((status, message)) => {
            eprintln!("{message}");
            status
        }
    }
}

/// Renders the resume input file at `path`. Errors carry the exit status:
/// 2 when the file cannot be read, 1 for malformed input.
async fn render_file(path: Option<&str>) -> Result<String, (i32, String)> {
    let Some(path) = path else {
        return Err((2, "Usage: resume-api render <resume.json>".to_string()));
    };

    if !Path::new(path).exists() {
        return Err((2, format!("File not found: {path}")));
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| (2, format!("Failed to read {path}: {e}")))?;

    let input = parse_resume_input(&raw).map_err(|e| (1, e.to_string()))?;
    Ok(render::render_document(&input))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn input_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_render_file_prints_document() {
        let file = input_file(r#"{"name": "Jane Doe", "description": "Engineer"}"#);
        let html = render_file(file.path().to_str()).await.unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<h1>Jane Doe</h1>"));
    }

    #[tokio::test]
    async fn test_render_file_missing_is_status_2() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        let (status, message) = render_file(missing.to_str()).await.unwrap_err();
        assert_eq!(status, 2);
        assert!(message.starts_with("File not found"));

        let (status, _) = render_file(None).await.unwrap_err();
        assert_eq!(status, 2);
    }

    #[tokio::test]
    async fn test_render_file_malformed_is_status_1() {
        let file = input_file(r#"{"name": "Jane", "experience": 42}"#);
        let (status, _) = render_file(file.path().to_str()).await.unwrap_err();
        assert_eq!(status, 1);

        let file = input_file("not json");
        let (status, _) = render_file(file.path().to_str()).await.unwrap_err();
        assert_eq!(status, 1);
    }

    #[tokio::test]
    async fn test_render_offline_exit_codes() {
        let args = |path: &str| vec!["resume-api".to_string(), "render".to_string(), path.to_string()];

        let bad = input_file("[1, 2]");
        assert_eq!(render_offline(&args(bad.path().to_str().unwrap())).await, 1);
        assert_eq!(render_offline(&args("/definitely/missing.json")).await, 2);
    }
}
