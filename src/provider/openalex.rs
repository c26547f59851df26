//! OpenAlex works provider.
//!
//! Issues a single `GET /works` request per page, filtered by publication
//! date range and keyword and sorted by publication date descending. The
//! client identifies itself with a User-Agent and, when configured, a
//! `mailto` address so requests land in OpenAlex's polite pool.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{PageRequest, ProviderError, ProviderResult, RawItem, WorksProvider};
use crate::config::RadarConfig;

/// Largest `per-page` value OpenAlex accepts.
pub const OPENALEX_MAX_PER_PAGE: usize = 200;

/// Results reachable with basic (page-number) paging.
pub const OPENALEX_RESULT_WINDOW: usize = 10_000;

/// Body of a `/works` response; only `results` is consumed.
#[derive(Debug, Deserialize)]
struct WorksPage {
    #[serde(default)]
    results: Option<Vec<RawItem>>,
}

impl WorksPage {
    /// Items of the page; a missing or null `results` is an empty page.
    fn into_items(self) -> Vec<RawItem> {
        self.results.unwrap_or_default()
    }
}

/// HTTP client for the OpenAlex works endpoint.
#[derive(Debug, Clone)]
pub struct OpenAlexProvider {
    client: Client,
    base_url: String,
    mailto: Option<String>,
}

impl OpenAlexProvider {
    /// Create a provider from the radar configuration.
    ///
    /// The request timeout and User-Agent are fixed on the underlying client,
    /// so every page request gets the same timeout.
    ///
    /// # Errors
    /// Returns `ProviderError::Config` if the HTTP client cannot be built
    pub fn new(config: &RadarConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
        })
    }

    fn works_url(&self) -> String {
        format!("{}/works", self.base_url)
    }
}

/// Query-string pairs for one page request.
pub fn page_query(request: &PageRequest<'_>, mailto: Option<&str>) -> Vec<(&'static str, String)> {
    let params = request.params;
    let mut query = vec![
        ("search", params.keyword.clone()),
        (
            "filter",
            format!(
                "from_publication_date:{},to_publication_date:{}",
                params.start_date.format("%Y-%m-%d"),
                params.end_date.format("%Y-%m-%d")
            ),
        ),
        ("sort", "publication_date:desc".to_string()),
        ("per-page", request.per_page.to_string()),
        ("page", request.page.to_string()),
    ];
    if let Some(mailto) = mailto {
        query.push(("mailto", mailto.to_string()));
    }
    query
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else {
        ProviderError::Network(error.to_string())
    }
}

#[async_trait]
impl WorksProvider for OpenAlexProvider {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> ProviderResult<Vec<RawItem>> {
        let query = page_query(request, self.mailto.as_deref());
        debug!("GET {} page={} per-page={}", self.works_url(), request.page, request.per_page);

        let response = self
            .client
            .get(self.works_url())
            .query(&query)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let page: WorksPage = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Parse(e.to_string())
            }
        })?;

        Ok(page.into_items())
    }

    fn max_page_size(&self) -> usize {
        OPENALEX_MAX_PER_PAGE
    }

    fn result_window(&self) -> Option<usize> {
        Some(OPENALEX_RESULT_WINDOW)
    }

    fn name(&self) -> &str {
        "openalex"
    }
}
