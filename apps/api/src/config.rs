use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
///
/// Every external service is optional at startup. Operations that need a
/// missing value fail with `AppError::Config` before any network call.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub nutrient_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub container_sas_url: Option<String>,
    pub table_sas_url: Option<String>,
    pub table_name: Option<String>,
    pub logs_container_sas_url: Option<String>,
    pub output_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            nutrient_api_key: optional_env("NUTRIENT_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            container_sas_url: optional_env("AZURE_CONTAINER_SAS_URL"),
            table_sas_url: optional_env("AZURE_TABLE_SAS_URL"),
            table_name: optional_env("AZURE_TABLE_NAME"),
            logs_container_sas_url: optional_env("AZURE_LOGS_CONTAINER_SAS_URL"),
            output_dir: optional_env("RESUME_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("resumes")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Table storage is only usable when both the SAS URL and the table name are set.
    pub fn table_settings(&self) -> Option<(&str, &str)> {
        match (&self.table_sas_url, &self.table_name) {
            (Some(url), Some(name)) => Some((url.as_str(), name.as_str())),
            _ => None,
        }
    }
}

/// Returns the value or a configuration error naming the missing variable.
pub fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, AppError> {
    value.ok_or_else(|| AppError::Config(format!("Required environment variable '{key}' is not set")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
