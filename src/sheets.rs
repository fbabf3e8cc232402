use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{DashboardConfig, SheetsCredentials};
use crate::error::{DashboardError, DashboardResult};
use crate::rows::RawRow;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// The dashboard's view of its tabular data source: named ranges of string
/// rows, fetched fallibly. Aggregation code only ever sees this trait, so
/// tests run on in-memory rows and the production client stays swappable.
#[async_trait]
pub trait RangeSource {
    async fn fetch_range(&self, range: &str) -> DashboardResult<Vec<RawRow>>;
}

/// Google Sheets v4 values client. Read-only; one HTTP GET per range. The
/// request timeout lives on the constructed client so every fetch inherits
/// the same policy.
pub struct SheetsClient {
    http: reqwest::Client,
    sheet_id: String,
    credentials: SheetsCredentials,
}

impl SheetsClient {
    pub fn new(config: &DashboardConfig) -> DashboardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| DashboardError::source_unavailable("<client>", e))?;

        Ok(SheetsClient {
            http,
            sheet_id: config.sheet_id.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// Values URL for a range, with the range percent-encoded as a single
    /// path segment (range names carry spaces and `!`).
    fn values_url(&self, range: &str) -> DashboardResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(SHEETS_API_BASE)
            .map_err(|e| DashboardError::source_unavailable(range, e))?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::source_unavailable(range, "bad base url"))?
            .push(&self.sheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }
}

/// Body of a values response. `values` is absent entirely for an empty range.
#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[async_trait]
impl RangeSource for SheetsClient {
    async fn fetch_range(&self, range: &str) -> DashboardResult<Vec<RawRow>> {
        let mut request = self.http.get(self.values_url(range)?);
        if let Some(token) = &self.credentials.bearer_token {
            request = request.bearer_auth(token);
        } else if let Some(key) = &self.credentials.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DashboardError::source_unavailable(range, e))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("sheets fetch for {range:?} failed with {status}");
            return Err(DashboardError::source_unavailable(
                range,
                format!("HTTP {status}"),
            ));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| DashboardError::source_unavailable(range, e))?;

        log::debug!("fetched {} rows from {range:?}", body.values.len());
        Ok(body.values.into_iter().map(RawRow::from_values).collect())
    }
}
