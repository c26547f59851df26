//! Query pipeline: fetch, normalize, enrich, aggregate.
//!
//! `QueryPipeline::run_query` is the single entry point for the presentation
//! layer. Only caller-input mistakes surface as errors; every failure of the
//! external source ends up as "fewer records than requested".
//!
//! # Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use scholar_radar::config::RadarConfig;
//! use scholar_radar::pipeline::QueryPipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = QueryPipeline::openalex(&RadarConfig::from_env()?)?;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//! let result = pipeline.run_query("glaucoma", start, end, 200).await?;
//!
//! println!("{} works, {:.1}% matched", result.records.len(), result.match_rate * 100.0);
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::cache::QueryCache;
use crate::config::{ConfigError, RadarConfig};
use crate::enrich::RecordEnricher;
use crate::fetch::PaginatedFetcher;
use crate::impact::ImpactFactorIndex;
use crate::models::{QueryParams, ResultSet, StopReason};
use crate::normalize::normalize_all;
use crate::provider::openalex::OpenAlexProvider;
use crate::provider::{ProviderError, WorksProvider};

/// Errors returned to callers of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The start date lies after the end date
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The record limit must be positive
    #[error("Invalid limit: must be a positive integer")]
    InvalidLimit,

    /// The pipeline could not be set up
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

impl From<ProviderError> for PipelineError {
    fn from(e: ProviderError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Reject inverted ranges and a zero limit.
pub fn validate_query(params: &QueryParams) -> PipelineResult<()> {
    if params.start_date > params.end_date {
        return Err(PipelineError::InvalidRange {
            start: params.start_date,
            end: params.end_date,
        });
    }
    if params.limit == 0 {
        return Err(PipelineError::InvalidLimit);
    }
    Ok(())
}

/// The fetch-enrich-aggregate pipeline over one works provider.
pub struct QueryPipeline<P>
where
    P: WorksProvider,
{
    /// Paginated retrieval
    fetcher: PaginatedFetcher<P>,

    /// Impact-factor lookup
    enricher: RecordEnricher,

    /// Cluster statistics
    aggregator: Aggregator,

    /// Memoized results
    cache: QueryCache,

    /// Clusters in the chart view
    top_n: Option<usize>,
}

impl QueryPipeline<OpenAlexProvider> {
    /// Pipeline over the OpenAlex API with the built-in impact-factor table.
    ///
    /// # Errors
    /// Returns `PipelineError::Config` for invalid settings or if the HTTP
    /// client cannot be built
    pub fn openalex(config: &RadarConfig) -> PipelineResult<Self> {
        let provider = OpenAlexProvider::new(config)?;
        Self::new(provider, Arc::new(ImpactFactorIndex::builtin()), config)
    }
}

impl<P> QueryPipeline<P>
where
    P: WorksProvider,
{
    /// Assemble a pipeline.
    ///
    /// # Arguments
    /// * `provider` - Source of raw works
    /// * `index` - Impact-factor table shared with other pipelines
    /// * `config` - Page size, throttle, cache and chart settings
    ///
    /// # Errors
    /// Returns `PipelineError::Config` if the configuration is invalid
    pub fn new(provider: P, index: Arc<ImpactFactorIndex>, config: &RadarConfig) -> PipelineResult<Self> {
        config.validate()?;

        Ok(Self {
            fetcher: PaginatedFetcher::from_config(provider, config),
            enricher: RecordEnricher::new(index),
            aggregator: Aggregator::new().with_max_points_per_cluster(config.max_points_per_cluster),
            cache: QueryCache::new(config.cache_ttl(), config.cache_max_entries),
            top_n: config.top_n,
        })
    }

    /// Stop pagination before the next page request once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.fetcher = self.fetcher.with_cancellation(flag);
        self
    }

    /// Change the number of clusters in the chart view.
    ///
    /// Cached results carry the old chart view, so the cache is cleared.
    pub fn set_top_n(&mut self, top_n: Option<usize>) {
        if self.top_n != top_n {
            self.cache.clear();
        }
        self.top_n = top_n;
    }

    pub fn top_n(&self) -> Option<usize> {
        self.top_n
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run a query.
    ///
    /// # Arguments
    /// * `keyword` - Free-text search term
    /// * `start_date` - First publication date included
    /// * `end_date` - Last publication date included
    /// * `limit` - Maximum number of records
    ///
    /// # Returns
    /// The result set, possibly served from the cache. It holds at most
    /// `limit` records and may be empty.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidRange` if `start_date > end_date` and
    /// `PipelineError::InvalidLimit` if `limit == 0`
    pub async fn run_query(
        &self,
        keyword: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        limit: usize,
    ) -> PipelineResult<Arc<ResultSet>> {
        let params = QueryParams::new(keyword, start_date, end_date, limit);
        self.run(params).await
    }

    /// Run a query from prepared parameters.
    pub async fn run(&self, params: QueryParams) -> PipelineResult<Arc<ResultSet>> {
        validate_query(&params)?;

        if let Some(cached) = self.cache.get(&params) {
            debug!("Cache hit for '{}'", params.keyword);
            return Ok(cached);
        }

        let outcome = self.fetcher.fetch(&params).await;
        let records = self.enricher.enrich(normalize_all(&outcome.items));

        let mut result = self.aggregator.aggregate(records, self.top_n);
        result.pages_requested = outcome.pages_requested;
        result.stop_reason = outcome.stop;

        info!(
            "Query '{}': {} records, {} matched ({:.1}%), {} clusters",
            params.keyword,
            result.records.len(),
            result.matched_count(),
            result.match_rate * 100.0,
            result.cluster_stats.len()
        );

        // Failed or cancelled fetches are not memoized so a later run can complete
        if result.stop_reason.is_failure() || result.stop_reason == StopReason::Cancelled {
            return Ok(Arc::new(result));
        }
        Ok(self.cache.insert(params, Arc::new(result)))
    }
}
