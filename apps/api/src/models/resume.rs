use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::slugify;

/// Partition shared by every resume entity in the metadata table.
pub const PARTITION_BY_CODE: &str = "by-code";

/// Page size token understood by the rendering API. Accepted case-insensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSize::A3 => "A3",
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a3" => Ok(PageSize::A3),
            "a4" => Ok(PageSize::A4),
            "a5" => Ok(PageSize::A5),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => Err(format!("unsupported page size '{other}'")),
        }
    }
}

impl TryFrom<String> for PageSize {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One generated resume as stored in the metadata table.
///
/// Serializes to the table entity shape (PascalCase attributes, fixed partition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResumeRecord {
    pub partition_key: String,
    pub row_key: String,
    pub original_name: String,
    pub name_slug: String,
    pub code: String,
    pub blob_url: String,
    pub page_size: PageSize,
    pub created_at: String,
    pub description: String,
}

impl ResumeRecord {
    /// Builds a record for `code`. The slug is always derived from `original_name`.
    pub fn new(
        code: &str,
        original_name: &str,
        description: &str,
        page_size: PageSize,
        blob_url: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            partition_key: PARTITION_BY_CODE.to_string(),
            row_key: code.to_string(),
            original_name: original_name.to_string(),
            name_slug: slugify(original_name),
            code: code.to_string(),
            blob_url: blob_url.to_string(),
            page_size,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            description: description.to_string(),
        }
    }
}

/// Normalized listing view of a stored entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub page_size: Option<String>,
    pub created_at: Option<String>,
    pub blob_url: Option<String>,
}

impl ResumeSummary {
    /// Projects a raw table entity, falling back to `RowKey` for the code and
    /// `NameSlug` for the name.
    pub fn from_entity(entity: &Map<String, Value>) -> Self {
        Self {
            code: first_present(entity, &["Code", "RowKey"]).unwrap_or_default(),
            name: first_present(entity, &["OriginalName", "NameSlug"]),
            description: first_present(entity, &["Description"]),
            page_size: first_present(entity, &["PageSize"]),
            created_at: first_present(entity, &["CreatedAt"]),
            blob_url: first_present(entity, &["BlobUrl"]),
        }
    }

    /// Blob URL if the record points at a stored object.
    pub fn stored_blob(&self) -> Option<&str> {
        self.blob_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

fn first_present(entity: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match entity.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Null) | Some(Value::String(_)) | None => None,
        Some(other) => Some(other.to_string()),
    })
}
