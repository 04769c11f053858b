use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::info;

use crate::errors::AppError;
use crate::storage::sas::SasUrl;

const DELETE_TIMEOUT: Duration = Duration::from_secs(30);
const DELETE_API_VERSION: &str = "2019-12-12";

/// Create-only object storage. Carried in `AppState` as `Arc<dyn BlobStore>`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `body` under `name`, failing if the object already exists.
    /// Returns the full object URL, access token included.
    async fn put_new(&self, name: &str, content_type: &str, body: Bytes)
        -> Result<String, AppError>;

    /// Deletes the object at `blob_url` together with its snapshots.
    async fn delete(&self, blob_url: &str) -> Result<(), AppError>;
}

/// Blob container client addressed by a container SAS URL.
pub struct BlobClient {
    client: Client,
    container: SasUrl,
    upload_timeout: Duration,
}

impl BlobClient {
    pub fn new(client: Client, container: SasUrl, upload_timeout: Duration) -> Self {
        Self {
            client,
            container,
            upload_timeout,
        }
    }
}

#[async_trait]
impl BlobStore for BlobClient {
    async fn put_new(
        &self,
        name: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, AppError> {
        let url = self.container.object_url(name);

        let response = self
            .client
            .put(&url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", content_type)
            .header("If-None-Match", "*")
            .timeout(self.upload_timeout)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote {
                service: "Blob upload",
                status: status.as_u16(),
                body,
            });
        }

        info!("Stored blob {name}");
        Ok(url)
    }

    async fn delete(&self, blob_url: &str) -> Result<(), AppError> {
        if blob_url.trim().is_empty() {
            return Err(AppError::Validation(
                "blob_url is required to delete a resume blob".to_string(),
            ));
        }

        let response = self
            .client
            .delete(blob_url.trim())
            .header("x-ms-version", DELETE_API_VERSION)
            .header("x-ms-delete-snapshots", "include")
            .timeout(DELETE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote {
                service: "Blob delete",
                status: status.as_u16(),
                body,
            });
        }

        info!("Deleted blob {}", strip_query(blob_url));
        Ok(())
    }
}

/// Drops the access token so URLs can be logged.
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{only_request, serve_canned};

    fn container(base: &str) -> BlobClient {
        let sas = SasUrl::parse(&format!("{base}/resumes?sv=1&sig=abc"), "T").unwrap();
        BlobClient::new(Client::new(), sas, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_put_new_is_create_only_block_blob() {
        let (base, requests) = serve_canned(201, &[], "").await;

        let url = container(&base)
            .put_new("jane-1a2b3c4d.pdf", "application/pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();

        assert_eq!(url, format!("{base}/resumes/jane-1a2b3c4d.pdf?sv=1&sig=abc"));
        let request = only_request(&requests);
        assert_eq!(request.method, "PUT");
        assert_eq!(request.uri.path(), "/resumes/jane-1a2b3c4d.pdf");
        assert_eq!(request.uri.query(), Some("sv=1&sig=abc"));
        assert_eq!(request.header("x-ms-blob-type"), "BlockBlob");
        assert_eq!(request.header("if-none-match"), "*");
        assert_eq!(request.header("content-type"), "application/pdf");
        assert_eq!(&request.body[..], b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_put_new_existing_blob_keeps_response_body() {
        let (base, _) = serve_canned(409, &[], "BlobAlreadyExists").await;

        let err = container(&base)
            .put_new("a.pdf", "application/pdf", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Remote { service: "Blob upload", status: 409, ref body } if body == "BlobAlreadyExists"
        ));
    }

    #[tokio::test]
    async fn test_delete_includes_snapshots() {
        let (base, requests) = serve_canned(202, &[], "").await;
        let blob_url = format!("{base}/resumes/a.pdf?sv=1&sig=abc");

        container(&base).delete(&blob_url).await.unwrap();

        let request = only_request(&requests);
        assert_eq!(request.method, "DELETE");
        assert_eq!(request.uri.path(), "/resumes/a.pdf");
        assert_eq!(request.uri.query(), Some("sv=1&sig=abc"));
        assert_eq!(request.header("x-ms-delete-snapshots"), "include");
        assert_eq!(request.header("x-ms-version"), DELETE_API_VERSION);
    }

    #[tokio::test]
    async fn test_delete_missing_blob_keeps_response_body() {
        let (base, _) = serve_canned(404, &[], "BlobNotFound").await;
        let blob_url = format!("{base}/resumes/a.pdf?sv=1");

        let err = container(&base).delete(&blob_url).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Remote { service: "Blob delete", status: 404, ref body } if body == "BlobNotFound"
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_url() {
        let sas = SasUrl::parse("https://acct.blob.core.windows.net/c?sv=1", "T").unwrap();
        let blobs = BlobClient::new(Client::new(), sas, Duration::from_secs(1));
        let err = blobs.delete("  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("https://acct.blob.core.windows.net/c/a.pdf?sig=secret"),
            "https://acct.blob.core.windows.net/c/a.pdf"
        );
        assert_eq!(strip_query("/tmp/a.pdf"), "/tmp/a.pdf");
    }
}
