//! Core data models for the scholar radar pipeline.
//!
//! This module contains the data structures shared across the pipeline stages:
//! the normalized publication record, per-cluster statistics, the query
//! parameters that double as the cache key, and the result set handed to the
//! presentation layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Marker shown in place of an impact factor when the journal had no match.
pub const NOT_MATCHED_LABEL: &str = "not matched";

/// A single publication coerced into the uniform schema.
///
/// Records are produced by the normalizer from raw API items and later gain an
/// impact factor from the enricher. `journal_name` and `topic_cluster` are
/// never empty; they fall back to named defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    /// Publication date as returned by the source (ISO-8601, may be empty)
    pub publication_date: String,

    /// Work title, or a placeholder when the source had none
    pub title: String,

    /// Display name of the hosting journal, or "Unknown"
    pub journal_name: String,

    /// First non-top-level concept, or "Others"
    pub topic_cluster: String,

    /// Bare DOI (resolver prefix stripped), may be empty
    pub doi_identifier: String,

    /// DOI link exactly as the source returned it, may be empty
    pub doi_url: String,

    /// Journal impact factor; `None` means the journal had no match
    #[serde(default)]
    pub impact_factor: Option<f64>,
}

impl ResultRecord {
    /// Whether the enricher found an impact factor for this record.
    pub fn is_matched(&self) -> bool {
        self.impact_factor.is_some()
    }

    /// Impact factor formatted for display, or the "not matched" marker.
    pub fn impact_factor_label(&self) -> String {
        match self.impact_factor {
            Some(score) => format!("{:.1}", score),
            None => NOT_MATCHED_LABEL.to_string(),
        }
    }
}

/// Publication volume of one topic cluster among the matched records.
///
/// The impact-factor values are carried along so the chart can draw the
/// quality distribution next to the volume bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterStat {
    /// Topic cluster label
    pub topic_cluster: String,

    /// Number of matched records in this cluster
    pub publication_count: usize,

    /// Impact factors of the cluster's records, in record order
    pub impact_factors: Vec<f64>,
}

impl ClusterStat {
    /// Mean impact factor of the cluster, `None` for an empty point cloud.
    pub fn mean_impact_factor(&self) -> Option<f64> {
        if self.impact_factors.is_empty() {
            return None;
        }
        let total: f64 = self.impact_factors.iter().sum();
        Some(total / self.impact_factors.len() as f64)
    }
}

/// Why pagination stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of items was collected
    LimitReached,

    /// The source returned an empty or short page
    Exhausted,

    /// The source's paging window was used up
    PageCapReached,

    /// A page request failed; earlier pages were kept
    RequestFailed(String),

    /// The caller cancelled between page requests
    Cancelled,
}

impl StopReason {
    /// Whether the fetch ended on a failed request.
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::RequestFailed(_))
    }
}

/// Parameters of one radar query.
///
/// Also serves as the memoization key of the query cache, so it derives
/// `Eq` and `Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams {
    /// Free-text keyword (trimmed)
    pub keyword: String,

    /// First publication date included
    pub start_date: NaiveDate,

    /// Last publication date included
    pub end_date: NaiveDate,

    /// Maximum number of records to retrieve
    pub limit: usize,
}

impl QueryParams {
    /// Create query parameters, trimming the keyword.
    pub fn new(keyword: &str, start_date: NaiveDate, end_date: NaiveDate, limit: usize) -> Self {
        Self {
            keyword: keyword.trim().to_string(),
            start_date,
            end_date,
            limit,
        }
    }
}

/// Output of one query, handed to the presentation layer.
///
/// `records` and `match_rate` always describe the full retrieval; only
/// `chart_clusters` is truncated to the top-N view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// All records, in source order (descending publication date)
    pub records: Vec<ResultRecord>,

    /// Records that carry an impact factor
    pub enriched_subset: Vec<ResultRecord>,

    /// Per-cluster counts over the enriched subset, descending by count
    pub cluster_stats: Vec<ClusterStat>,

    /// Chart-facing view: the leading `top_n` entries of `cluster_stats`
    pub chart_clusters: Vec<ClusterStat>,

    /// Fraction of records with an impact factor, in [0, 1]
    pub match_rate: f64,

    /// Number of page requests issued
    pub pages_requested: usize,

    /// Why pagination stopped
    pub stop_reason: StopReason,
}

impl ResultSet {
    /// Whether the query produced no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that matched an impact factor.
    pub fn matched_count(&self) -> usize {
        self.enriched_subset.len()
    }
}
