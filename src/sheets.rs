//! Attribute pool import from a Google spreadsheet.
//!
//! The sheet is read through the Sheets `values` REST endpoint with an
//! API key: the header row names the categories, each column below it
//! lists candidate values. Import failures are reported to the caller
//! and never touch the pool already in memory.

use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::SheetConfig;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Response shape of the `values` endpoint.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Read-only client for the configured spreadsheet.
pub struct SheetClient {
    config: SheetConfig,
    client: reqwest::Client,
}

impl SheetClient {
    pub fn new(config: SheetConfig) -> Self {
        SheetClient {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the sheet and return `(header, column cells)` pairs.
    ///
    /// Rows from the API are ragged: trailing empty cells are omitted, so
    /// columns are assembled index-by-index.
    pub async fn fetch_columns(&self) -> Result<Vec<(String, Vec<String>)>> {
        if self.config.spreadsheet_id.is_empty() {
            return Err(anyhow!("spreadsheet_id is not configured"));
        }
        let url = format!(
            "{}/{}/values/{}?key={}",
            SHEETS_API_BASE, self.config.spreadsheet_id, self.config.range, self.config.api_key
        );
        debug!(
            "Fetching sheet {} range {}",
            self.config.spreadsheet_id, self.config.range
        );

        let request = self.client.get(&url).send();
        let response = timeout(Duration::from_secs(self.config.timeout_secs), request)
            .await
            .map_err(|_| anyhow!("sheet request timed out after {}s", self.config.timeout_secs))?
            .map_err(|e| anyhow!("sheet request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("sheet request returned HTTP {}", response.status()));
        }
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| anyhow!("sheet response is not valid JSON: {}", e))?;

        Ok(columns_from_rows(range.values))
    }
}

/// Pivot row-major sheet data into per-column `(header, cells)` pairs.
fn columns_from_rows(rows: Vec<Vec<String>>) -> Vec<(String, Vec<String>)> {
    let mut rows = rows.into_iter();
    let headers = match rows.next() {
        Some(h) => h,
        None => {
            warn!("Sheet is empty, no header row");
            return Vec::new();
        }
    };
    let body: Vec<Vec<String>> = rows.collect();

    headers
        .into_iter()
        .enumerate()
        .map(|(index, header)| {
            let cells = body
                .iter()
                .filter_map(|row| row.get(index))
                .cloned()
                .collect();
            (header, cells)
        })
        .collect()
}
