//! HTTP client for reading a form-response spreadsheet.
//!
//! Uses `GET /v4/spreadsheets/{id}/values/{range}`. The first returned row is
//! the header; the API omits trailing empty cells, so short rows are padded.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use feedpulse_store::{LiveSource, StoreError, Table};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::auth::ServiceAccount;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid sheets URL: {0}")]
    Url(String),
    #[error("service account key {}: {message}", path.display())]
    Key { path: PathBuf, message: String },
    #[error("token assertion failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// How requests are authorised.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// `?key=` query parameter; enough for link-shared sheets.
    ApiKey(String),
    /// OAuth access token sent as a bearer header.
    Bearer(String),
    /// Tokens minted from a service-account key file.
    ServiceAccount(Arc<ServiceAccount>),
    None,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    credentials: Credentials,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: String, range: String, credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id,
            range,
            credentials,
        }
    }

    /// Point the client at another API host (no trailing slash needed).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Values endpoint with the id and range percent-encoded as path segments.
    pub fn values_url(&self) -> Result<reqwest::Url, SheetsError> {
        let mut url =
            reqwest::Url::parse(&self.base_url).map_err(|e| SheetsError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        if let Credentials::ApiKey(key) = &self.credentials {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    /// Fetch the raw cell grid.
    pub async fn fetch_values(&self) -> Result<Vec<Vec<serde_json::Value>>, SheetsError> {
        let url = self.values_url()?;
        info!(spreadsheet = %self.spreadsheet_id, range = %self.range, "fetching sheet values");

        let mut request = self.client.get(url);
        match &self.credentials {
            Credentials::Bearer(token) => request = request.bearer_auth(token),
            Credentials::ServiceAccount(account) => {
                request = request.bearer_auth(account.access_token(&self.client).await?);
            }
            Credentials::ApiKey(_) | Credentials::None => {}
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let range: ValueRange = serde_json::from_str(&body)?;
        info!(rows = range.values.len(), "fetched sheet values");
        Ok(range.values)
    }
}

#[async_trait]
impl LiveSource for SheetsClient {
    async fn fetch_table(&self) -> Result<Table, StoreError> {
        let values = self
            .fetch_values()
            .await
            .map_err(|e| StoreError::Live(e.to_string()))?;
        Ok(table_from_values(values))
    }

    fn describe(&self) -> String {
        format!("sheet {} ({})", self.spreadsheet_id, self.range)
    }
}

/// First row is the header. Numbers and booleans are rendered as text.
pub fn table_from_values(values: Vec<Vec<serde_json::Value>>) -> Table {
    let mut rows = values.into_iter().map(|row| row.into_iter().map(cell_text).collect());
    let headers: Vec<String> = rows.next().unwrap_or_default();
    Table::new(headers, rows.collect())
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
