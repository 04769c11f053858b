//! Client for the HTML-to-PDF rendering API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::resume::PageSize;

const NUTRIENT_API_URL: &str = "https://api.nutrient.io/build";
const TIMEOUT: Duration = Duration::from_secs(60);
const HTML_PART: &str = "index.html";

/// Turns an HTML document into PDF bytes. Carried in `AppState` as `Arc<dyn PdfRenderer>`.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str, page_size: PageSize) -> Result<Bytes, AppError>;
}

pub struct NutrientClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl NutrientClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: NUTRIENT_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Build instructions: one HTML part rendered to a single PDF output.
pub fn build_instructions(page_size: PageSize) -> Value {
    json!({
        "parts": [
            { "html": HTML_PART }
        ],
        "outputs": [
            {
                "type": "pdf",
                "name": "resume.pdf",
                "input": HTML_PART,
                "options": { "page": { "size": page_size.as_str() } }
            }
        ]
    })
}

#[async_trait]
impl PdfRenderer for NutrientClient {
    async fn render(&self, html: &str, page_size: PageSize) -> Result<Bytes, AppError> {
        let api_key = crate::config::require(self.api_key.as_deref(), "NUTRIENT_API_KEY")?;

        let html_part = Part::bytes(html.as_bytes().to_vec())
            .file_name(HTML_PART)
            .mime_str("text/html; charset=utf-8")?;
        let form = Form::new()
            .part(HTML_PART, html_part)
            .text("instructions", build_instructions(page_size).to_string());

        debug!("Submitting {} bytes of HTML for {page_size} rendering", html.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("Accept", "application/pdf, application/zip")
            .timeout(TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote {
                service: "PDF generation",
                status: status.as_u16(),
                body,
            });
        }

        let pdf = response.bytes().await?;
        info!("Rendered PDF ({} bytes)", pdf.len());
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{only_request, serve_canned};

    #[test]
    fn test_instructions_carry_page_size() {
        let instructions = build_instructions(PageSize::Letter);
        assert_eq!(instructions["parts"][0]["html"], "index.html");
        assert_eq!(instructions["outputs"][0]["type"], "pdf");
        assert_eq!(instructions["outputs"][0]["input"], "index.html");
        assert_eq!(instructions["outputs"][0]["options"]["page"]["size"], "Letter");
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let renderer = NutrientClient::new(Client::new(), None);
        let err = renderer.render("<p>x</p>", PageSize::A4).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("NUTRIENT_API_KEY")));
    }

    #[tokio::test]
    async fn test_render_posts_html_and_instructions() {
        let (base, requests) = serve_canned(
            200,
            &[("content-type", "application/pdf")],
            "%PDF-1.7 fake",
        )
        .await;
        let renderer = NutrientClient::new(Client::new(), Some("secret".to_string()))
            .with_endpoint(format!("{base}/build"));

        let pdf = renderer
            .render("<h1>Jane</h1>", PageSize::Legal)
            .await
            .unwrap();
        assert_eq!(&pdf[..], b"%PDF-1.7 fake");

        let request = only_request(&requests);
        assert_eq!(request.method, "POST");
        assert_eq!(request.uri.path(), "/build");
        assert_eq!(request.header("authorization"), "Bearer secret");
        assert_eq!(request.header("accept"), "application/pdf, application/zip");
        assert!(request.header("content-type").starts_with("multipart/form-data"));

        let body = request.body_text();
        assert!(body.contains(r#"name="index.html"; filename="index.html""#));
        assert!(body.contains("text/html; charset=utf-8"));
        assert!(body.contains("<h1>Jane</h1>"));
        assert!(body.contains(r#"name="instructions""#));
        assert!(body.contains(&build_instructions(PageSize::Legal).to_string()));
    }

    #[tokio::test]
    async fn test_render_failure_keeps_response_body() {
        let (base, _) = serve_canned(401, &[], r#"{"error":"invalid key"}"#).await;
        let renderer = NutrientClient::new(Client::new(), Some("bad".to_string()))
            .with_endpoint(format!("{base}/build"));

        let err = renderer.render("<p>x</p>", PageSize::A4).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Remote { service: "PDF generation", status: 401, ref body } if body.contains("invalid key")
        ));
    }
}
