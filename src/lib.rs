//! Scholar Radar - keyword and date-range radar over scholarly works.
//!
//! This library queries a public scholarly-works API for publications matching
//! a keyword and a publication-date range, enriches each result with a journal
//! impact factor from a static table, and aggregates the results per topic
//! cluster for display.
//!
//! # Architecture
//!
//! The system is organized into several key modules:
//!
//! - **models**: Core data structures (ResultRecord, ClusterStat, ResultSet, etc.)
//! - **impact**: Static journal impact-factor index with fuzzy lookup
//! - **provider**: Single-page access to the works API (OpenAlex)
//! - **fetch**: Sequential, polite pagination with partial results on failure
//! - **normalize**: Raw items to uniform records, with named defaults
//! - **enrich**: Impact-factor attachment
//! - **aggregate**: Per-cluster statistics and the top-N chart view
//! - **cache**: TTL memoization of query results
//! - **pipeline**: The `run_query` entry point
//! - **history**: In-memory search history
//! - **config**: Runtime settings
//!
//! # Workflow
//!
//! 1. Validate the keyword, date range and limit
//! 2. Serve a fresh cached result if there is one
//! 3. Fetch pages until the limit, the end of the source, or a failure
//! 4. Normalize raw items into records
//! 5. Attach impact factors
//! 6. Count records per topic cluster and compute the match rate
//!
//! # Example
//!
//! ```ignore
//! use scholar_radar::{config::RadarConfig, pipeline::QueryPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = QueryPipeline::openalex(&RadarConfig::from_env()?)?;
//!     let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let end = chrono::NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//!
//!     let result = pipeline.run_query("glaucoma", start, end, 200).await?;
//!     for stat in &result.chart_clusters {
//!         println!("{}: {}", stat.topic_cluster, stat.publication_count);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod fetch;
pub mod history;
pub mod impact;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod provider;

// Re-export commonly used types at the crate root
pub use config::RadarConfig;
pub use impact::{ImpactFactorIndex, MatchPolicy};
pub use models::{ClusterStat, QueryParams, ResultRecord, ResultSet, StopReason};
pub use pipeline::{PipelineError, QueryPipeline};
pub use provider::{RawItem, WorksProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of records per query
pub const DEFAULT_LIMIT: usize = 200;

/// Number of history entries shown by front ends
pub const HISTORY_DISPLAY_LEN: usize = 6;
