//! Metadata table: entity insert, point read, and the paginated by-code listing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::resume::{ResumeRecord, ResumeSummary, PARTITION_BY_CODE};
use crate::storage::sas::SasUrl;

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

const TIMEOUT: Duration = Duration::from_secs(30);
const ODATA_JSON: &str = "application/json;odata=nometadata";
const NEXT_PARTITION_HEADER: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_HEADER: &str = "x-ms-continuation-NextRowKey";

/// Server-issued position to resume a query from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub next_partition_key: String,
    pub next_row_key: String,
}

/// One page of raw entities.
#[derive(Debug, Clone, Default)]
pub struct TablePage {
    pub entities: Vec<Map<String, Value>>,
    pub continuation: Option<Continuation>,
}

/// Resume metadata store. Carried in `AppState` as `Arc<dyn MetadataStore>`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(&self, record: &ResumeRecord) -> Result<(), AppError>;

    /// Point read of one by-code entity. `None` when it does not exist.
    async fn get(&self, code: &str) -> Result<Option<ResumeSummary>, AppError>;

    /// Fetches one page of by-code entities starting at `continuation`.
    async fn query_page(
        &self,
        page_size: u32,
        continuation: Option<&Continuation>,
    ) -> Result<TablePage, AppError>;
}

/// Lists every by-code entity, following continuation tokens until the server
/// stops returning them or `max_pages` pages have been read.
///
/// A failed page aborts the listing; nothing fetched before it is returned.
pub async fn list_resumes(
    store: &dyn MetadataStore,
    page_size: u32,
    max_pages: Option<u32>,
) -> Result<Vec<ResumeSummary>, AppError> {
    let mut resumes = Vec::new();
    let mut continuation: Option<Continuation> = None;
    let mut pages_fetched: u32 = 0;

    loop {
        let page = store.query_page(page_size, continuation.as_ref()).await?;
        resumes.extend(page.entities.iter().map(ResumeSummary::from_entity));
        pages_fetched += 1;

        let Some(next) = page.continuation else {
            break;
        };
        if max_pages.is_some_and(|limit| pages_fetched >= limit) {
            debug!("Stopping listing at page limit {pages_fetched}");
            break;
        }
        continuation = Some(next);
    }

    info!(
        "Listed {} resumes across {pages_fetched} page(s)",
        resumes.len()
    );
    Ok(resumes)
}

/// Reads the continuation pair from response headers. Both halves must be present.
pub fn continuation_from_headers(headers: &HeaderMap) -> Option<Continuation> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Some(Continuation {
        next_partition_key: header(NEXT_PARTITION_HEADER)?,
        next_row_key: header(NEXT_ROW_HEADER)?,
    })
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

/// Table storage client addressed by an account (or table) SAS URL.
pub struct TableClient {
    client: Client,
    table_url: String,
    sas_query: String,
}

impl TableClient {
    pub fn new(client: Client, table_sas_url: &str, table_name: &str) -> Result<Self, AppError> {
        let sas = SasUrl::parse(table_sas_url, "AZURE_TABLE_SAS_URL")?;
        let table_url = sas.table_url(table_name)?;

        Ok(Self {
            client,
            table_url,
            sas_query: sas.query().to_string(),
        })
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Accept", ODATA_JSON)
            .header("DataServiceVersion", "3.0;NetFx")
            .header("MaxDataServiceVersion", "3.0;NetFx")
            .header("x-ms-version", "2019-02-02")
            .timeout(TIMEOUT)
    }

    /// GET for one page of by-code entities. The SAS query stays verbatim; the
    /// filter and continuation pair are appended as encoded parameters.
    fn query_request(&self, page_size: u32, continuation: Option<&Continuation>) -> RequestBuilder {
        let filter = format!("PartitionKey eq '{PARTITION_BY_CODE}'");
        let mut request = self
            .client
            .get(format!("{}?{}", self.table_url, self.sas_query))
            .query(&[("$filter", filter), ("$top", page_size.to_string())]);
        if let Some(next) = continuation {
            request = request.query(&[
                ("NextPartitionKey", next.next_partition_key.as_str()),
                ("NextRowKey", next.next_row_key.as_str()),
            ]);
        }
        self.with_headers(request)
    }

    /// Codes are restricted to `[A-Za-z0-9_-]` before they reach here.
    fn entity_url(&self, code: &str) -> String {
        format!(
            "{}(PartitionKey='{}',RowKey='{}')?{}",
            self.table_url,
            PARTITION_BY_CODE,
            code.replace('\'', "''"),
            self.sas_query
        )
    }
}

#[async_trait]
impl MetadataStore for TableClient {
    async fn insert(&self, record: &ResumeRecord) -> Result<(), AppError> {
        if record.partition_key.is_empty() || record.row_key.is_empty() {
            return Err(AppError::MalformedInput(
                "Entity must include non-empty 'PartitionKey' and 'RowKey'".to_string(),
            ));
        }

        let url = format!("{}?{}", self.table_url, self.sas_query);
        let response = self
            .with_headers(self.client.post(url))
            .header("Content-Type", ODATA_JSON)
            .header("Prefer", "return-no-content")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote {
                service: "Table insert",
                status: status.as_u16(),
                body,
            });
        }

        info!("Stored metadata for resume {}", record.code);
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Option<ResumeSummary>, AppError> {
        let response = self
            .with_headers(self.client.get(self.entity_url(code)))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::Remote {
                service: "Table read",
                status: status.as_u16(),
                body,
            });
        }

        let entity: Map<String, Value> = serde_json::from_str(&body).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("failed to parse table entity: {e}"))
        })?;
        Ok(Some(ResumeSummary::from_entity(&entity)))
    }

    async fn query_page(
        &self,
        page_size: u32,
        continuation: Option<&Continuation>,
    ) -> Result<TablePage, AppError> {
        let response = self.query_request(page_size, continuation).send().await?;

        let status = response.status();
        let next = continuation_from_headers(response.headers());
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::Remote {
                service: "Table query",
                status: status.as_u16(),
                body,
            });
        }

        let payload = if body.trim().is_empty() {
            QueryResponse::default()
        } else {
            serde_json::from_str::<QueryResponse>(&body).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("failed to parse table query response: {e}"))
            })?
        };

        Ok(TablePage {
            entities: payload.value,
            continuation: next,
        })
    }
}
