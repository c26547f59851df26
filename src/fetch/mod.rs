//! Paginated retrieval of raw works.
//!
//! The fetcher drives a [`WorksProvider`] one page at a time, strictly in
//! sequence, until one of these holds:
//!
//! - `limit` items have been collected
//! - the source returns an empty page, or a page shorter than requested
//! - the source's paging window is used up
//! - a page request fails
//! - the caller cancels
//!
//! A failed request is not an error for the caller: the items accumulated
//! so far are returned together with the reason pagination stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RadarConfig;
use crate::models::{QueryParams, StopReason};
use crate::provider::{PageRequest, RawItem, WorksProvider};

/// Items retrieved by one fetch, and why it stopped.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Raw items in source order, never more than the limit
    pub items: Vec<RawItem>,

    /// Number of page requests issued, including a failed one
    pub pages_requested: usize,

    /// Why pagination stopped
    pub stop: StopReason,
}

/// Sequential, polite page loop over a works provider.
pub struct PaginatedFetcher<P>
where
    P: WorksProvider,
{
    /// Source of pages
    provider: P,

    /// Requested page size, before clamping to the provider maximum
    per_page: usize,

    /// Pause between consecutive page requests
    throttle: Duration,

    /// Checked before every page request
    cancel: Option<Arc<AtomicBool>>,
}

impl<P> PaginatedFetcher<P>
where
    P: WorksProvider,
{
    /// Create a fetcher.
    ///
    /// # Arguments
    /// * `provider` - Source of pages
    /// * `per_page` - Page size; clamped to `1..=provider.max_page_size()`
    /// * `throttle` - Pause between page requests (none before the first)
    pub fn new(provider: P, per_page: usize, throttle: Duration) -> Self {
        Self {
            provider,
            per_page,
            throttle,
            cancel: None,
        }
    }

    /// Create a fetcher with the page size and throttle from a config.
    pub fn from_config(provider: P, config: &RadarConfig) -> Self {
        Self::new(provider, config.per_page, config.throttle())
    }

    /// Attach a cooperative cancellation flag.
    ///
    /// Setting the flag stops the fetch before its next page request; a
    /// request already in flight runs to completion.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Page size actually requested from the provider.
    pub fn effective_page_size(&self) -> usize {
        self.per_page.clamp(1, self.provider.max_page_size().max(1))
    }

    /// Highest page number the provider can serve, if it has a window.
    pub fn page_cap(&self) -> Option<usize> {
        self.provider
            .result_window()
            .map(|window| (window / self.effective_page_size()).max(1))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Retrieve up to `params.limit` raw items.
    ///
    /// Never fails: transport problems end pagination and the partial
    /// result is returned.
    pub async fn fetch(&self, params: &QueryParams) -> FetchOutcome {
        let limit = params.limit;
        let per_page = self.effective_page_size();
        let page_cap = self.page_cap();

        info!(
            "Fetching up to {} works for '{}' ({} to {}) from {}",
            limit,
            params.keyword,
            params.start_date,
            params.end_date,
            self.provider.name()
        );

        let mut items: Vec<RawItem> = Vec::with_capacity(limit.min(per_page));
        let mut pages_requested = 0;
        let mut page = 1;

        let stop = loop {
            if items.len() >= limit {
                break StopReason::LimitReached;
            }
            if page_cap.is_some_and(|cap| page > cap) {
                break StopReason::PageCapReached;
            }
            if self.is_cancelled() {
                break StopReason::Cancelled;
            }
            if page > 1 && !self.throttle.is_zero() {
                tokio::time::sleep(self.throttle).await;
            }

            let request = PageRequest {
                params,
                page,
                per_page,
            };
            pages_requested += 1;

            let received = match self.provider.fetch_page(&request).await {
                Ok(received) => received,
                Err(e) => {
                    warn!(
                        "Page {} from {} failed, keeping {} items: {}",
                        page,
                        self.provider.name(),
                        items.len(),
                        e
                    );
                    break StopReason::RequestFailed(e.to_string());
                }
            };

            let received_count = received.len();
            debug!("Page {} returned {} items", page, received_count);
            if received_count == 0 {
                break StopReason::Exhausted;
            }

            let remaining = limit - items.len();
            items.extend(received.into_iter().take(remaining));

            if items.len() >= limit {
                break StopReason::LimitReached;
            }
            if received_count < per_page {
                break StopReason::Exhausted;
            }
            page += 1;
        };

        info!(
            "Fetched {} works in {} page requests ({:?})",
            items.len(),
            pages_requested,
            stop
        );

        FetchOutcome {
            items,
            pages_requested,
            stop,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::{ProviderError, ProviderResult};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted page source that records the page numbers it was asked for.
    #[derive(Clone)]
    pub(crate) struct MockProvider {
        /// Page sizes to serve, page 1 first; pages past the end are empty
        pages: Vec<usize>,
        /// 1-based page number that fails, if any
        fail_on_page: Option<usize>,
        max_page_size: usize,
        result_window: Option<usize>,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl MockProvider {
        pub(crate) fn new(pages: Vec<usize>) -> Self {
            Self {
                pages,
                fail_on_page: None,
                max_page_size: 200,
                result_window: None,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub(crate) fn failing_on(mut self, page: usize) -> Self {
            self.fail_on_page = Some(page);
            self
        }

        fn with_window(mut self, window: usize) -> Self {
            self.result_window = Some(window);
            self
        }

        fn with_max_page_size(mut self, max: usize) -> Self {
            self.max_page_size = max;
            self
        }

        pub(crate) fn requested_pages(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub(crate) fn mock_item(page: usize, index: usize) -> RawItem {
        let journal = if index % 2 == 0 { "Nature" } else { "Obscure Letters" };
        RawItem::new(json!({
            "publication_date": "2024-01-01",
            "title": format!("Work {}-{}", page, index),
            "doi": format!("https://doi.org/10.1000/{}.{}", page, index),
            "primary_location": {"source": {"display_name": journal}},
            "concepts": [{"display_name": "Medicine", "level": 0}, {"display_name": "Glaucoma", "level": 1}]
        }))
    }

    #[async_trait]
    impl WorksProvider for MockProvider {
        async fn fetch_page(&self, request: &PageRequest<'_>) -> ProviderResult<Vec<RawItem>> {
            self.calls.lock().unwrap().push(request.page);
            if self.fail_on_page == Some(request.page) {
                return Err(ProviderError::Status(503));
            }
            let size = self.pages.get(request.page - 1).copied().unwrap_or(0);
            Ok((0..size).map(|i| mock_item(request.page, i)).collect())
        }

        fn max_page_size(&self) -> usize {
            self.max_page_size
        }

        fn result_window(&self) -> Option<usize> {
            self.result_window
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn params(limit: usize) -> QueryParams {
        QueryParams::new(
            "glaucoma",
            NaiveDate::from_ymd_opt(2023, 10, 18).unwrap(),
            NaiveDate::from_ymd_opt(2024, 10, 18).unwrap(),
            limit,
        )
    }

    #[tokio::test]
    async fn test_stops_at_limit_without_extra_page() {
        let provider = MockProvider::new(vec![30, 20, 30]);
        let fetcher = PaginatedFetcher::new(provider.clone(), 30, Duration::ZERO);

        let outcome = fetcher.fetch(&params(50)).await;
        assert_eq!(outcome.items.len(), 50);
        assert_eq!(outcome.pages_requested, 2);
        assert_eq!(outcome.stop, StopReason::LimitReached);
        assert_eq!(provider.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_truncates_last_page_to_limit() {
        let provider = MockProvider::new(vec![30, 30, 30]);
        let fetcher = PaginatedFetcher::new(provider.clone(), 30, Duration::ZERO);

        let outcome = fetcher.fetch(&params(45)).await;
        assert_eq!(outcome.items.len(), 45);
        assert_eq!(provider.requested_pages(), vec![1, 2]);
        assert_eq!(outcome.items[44].title(), Some("Work 2-14"));
    }

    #[tokio::test]
    async fn test_short_page_means_exhausted() {
        let provider = MockProvider::new(vec![30, 12, 30]);
        let fetcher = PaginatedFetcher::new(provider.clone(), 30, Duration::ZERO);

        let outcome = fetcher.fetch(&params(200)).await;
        assert_eq!(outcome.items.len(), 42);
        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(provider.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_page_means_exhausted() {
        let provider = MockProvider::new(vec![30, 30]);
        let fetcher = PaginatedFetcher::new(provider.clone(), 30, Duration::ZERO);

        let outcome = fetcher.fetch(&params(200)).await;
        assert_eq!(outcome.items.len(), 60);
        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(provider.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failure_on_first_page_returns_empty() {
        let provider = MockProvider::new(vec![30]).failing_on(1);
        let fetcher = PaginatedFetcher::new(provider, 30, Duration::ZERO);

        let outcome = fetcher.fetch(&params(50)).await;
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.pages_requested, 1);
        assert!(outcome.stop.is_failure());
    }

    #[tokio::test]
    async fn test_failure_mid_way_keeps_partial_results() {
        let provider = MockProvider::new(vec![30, 30, 30]).failing_on(2);
        let fetcher = PaginatedFetcher::new(provider.clone(), 30, Duration::ZERO);

        let outcome = fetcher.fetch(&params(90)).await;
        assert_eq!(outcome.items.len(), 30);
        assert!(matches!(outcome.stop, StopReason::RequestFailed(_)));
        assert_eq!(provider.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_respects_page_cap() {
        // Endless source of full pages, window of 100 results at 25 per page
        let provider = MockProvider::new(vec![25; 50]).with_window(100);
        let fetcher = PaginatedFetcher::new(provider.clone(), 25, Duration::ZERO);

        assert_eq!(fetcher.page_cap(), Some(4));
        let outcome = fetcher.fetch(&params(1000)).await;
        assert_eq!(outcome.items.len(), 100);
        assert_eq!(outcome.stop, StopReason::PageCapReached);
        assert_eq!(provider.requested_pages(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_page_size_is_clamped() {
        let provider = MockProvider::new(vec![10, 10, 3]).with_max_page_size(10);
        let fetcher = PaginatedFetcher::new(provider.clone(), 500, Duration::ZERO);

        assert_eq!(fetcher.effective_page_size(), 10);
        let outcome = fetcher.fetch(&params(100)).await;
        assert_eq!(outcome.items.len(), 23);
        assert_eq!(outcome.stop, StopReason::Exhausted);

        let zero = PaginatedFetcher::new(MockProvider::new(vec![]), 0, Duration::ZERO);
        assert_eq!(zero.effective_page_size(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let provider = MockProvider::new(vec![30, 30]);
        let flag = Arc::new(AtomicBool::new(true));
        let fetcher =
            PaginatedFetcher::new(provider.clone(), 30, Duration::ZERO).with_cancellation(flag);

        let outcome = fetcher.fetch(&params(50)).await;
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert!(provider.requested_pages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_between_pages() {
        let provider = MockProvider::new(vec![10, 10, 5]);
        let fetcher = PaginatedFetcher::new(provider, 10, Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        let outcome = fetcher.fetch(&params(100)).await;
        assert_eq!(outcome.items.len(), 25);
        // Two pauses: before page 2 and before page 3
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
