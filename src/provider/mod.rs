//! Works provider module.
//!
//! This module defines the interface for retrieving one page of raw scholarly
//! works from a search endpoint, and includes the OpenAlex implementation.
//!
//! The `WorksProvider` trait abstracts the transport so the paginated fetcher
//! can be driven by the real HTTP client or by in-memory mocks in tests.
//! A provider only ever answers for a single page; pagination, termination and
//! politeness throttling belong to the fetcher.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::QueryParams;

pub mod openalex;
pub mod raw;

pub use raw::RawItem;

/// Errors that can occur when requesting a page from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The endpoint answered with a non-success status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// The response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A single page request.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    /// Keyword and date range of the query
    pub params: &'a QueryParams,

    /// 1-based page number
    pub page: usize,

    /// Requested page size
    pub per_page: usize,
}

/// Trait for sources of raw scholarly works.
///
/// # Design Notes
///
/// - Implementations return items in the source's order (descending
///   publication date for OpenAlex)
/// - Any failure is reported as `ProviderError`; the caller decides whether
///   it is fatal
/// - Implementations must not retry on their own
#[async_trait]
pub trait WorksProvider: Send + Sync {
    /// Fetch one page of raw items.
    ///
    /// # Arguments
    /// * `request` - Query parameters, page number and page size
    ///
    /// # Returns
    /// The items on that page; an empty vector means the source is exhausted
    ///
    /// # Errors
    /// Returns `ProviderError` on transport failure, timeout, non-success
    /// status or an unparseable body
    async fn fetch_page(&self, request: &PageRequest<'_>) -> ProviderResult<Vec<RawItem>>;

    /// Largest page size the endpoint accepts.
    fn max_page_size(&self) -> usize;

    /// Maximum number of results reachable through page-number paging.
    ///
    /// `None` means the source imposes no window.
    fn result_window(&self) -> Option<usize> {
        None
    }

    /// Human-readable name of this provider, used in logs.
    fn name(&self) -> &str;
}
