//! Per-topic aggregation of enriched records.
//!
//! Groups the records that carry an impact factor by topic cluster, counts
//! each cluster, and derives the chart-facing top-N view. The full record
//! list and the match rate are never affected by the top-N truncation.

use std::collections::HashMap;

use crate::models::{ClusterStat, ResultRecord, ResultSet, StopReason};

/// Builds a `ResultSet` from enriched records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    /// Cap on impact-factor points kept per charted cluster
    max_points_per_cluster: Option<usize>,
}

impl Aggregator {
    /// Create an aggregator that charts every point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of impact-factor points drawn per charted cluster.
    ///
    /// Only `chart_clusters` is thinned; `cluster_stats` keeps every value.
    pub fn with_max_points_per_cluster(mut self, max_points: Option<usize>) -> Self {
        self.max_points_per_cluster = max_points;
        self
    }

    /// Aggregate records into a result set.
    ///
    /// # Arguments
    /// * `records` - Enriched records in source order
    /// * `top_n` - Number of clusters in the chart view (`None` for all)
    ///
    /// Pagination metadata defaults to "no requests"; the pipeline fills it
    /// in from the fetch outcome.
    pub fn aggregate(&self, records: Vec<ResultRecord>, top_n: Option<usize>) -> ResultSet {
        let enriched_subset: Vec<ResultRecord> =
            records.iter().filter(|r| r.is_matched()).cloned().collect();

        let cluster_stats = cluster_stats(&enriched_subset);
        let chart_clusters = self.chart_view(&cluster_stats, top_n);
        let match_rate = match_rate(enriched_subset.len(), records.len());

        ResultSet {
            records,
            enriched_subset,
            cluster_stats,
            chart_clusters,
            match_rate,
            pages_requested: 0,
            stop_reason: StopReason::Exhausted,
        }
    }

    fn chart_view(&self, stats: &[ClusterStat], top_n: Option<usize>) -> Vec<ClusterStat> {
        let shown = top_n.unwrap_or(stats.len()).min(stats.len());
        stats[..shown]
            .iter()
            .cloned()
            .map(|mut stat| {
                if let Some(max) = self.max_points_per_cluster {
                    stat.impact_factors = thin_points(&stat.impact_factors, max);
                }
                stat
            })
            .collect()
    }
}

/// Count matched records per cluster, sorted by count descending and then
/// by cluster name ascending.
pub fn cluster_stats(enriched: &[ResultRecord]) -> Vec<ClusterStat> {
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in enriched {
        if let Some(score) = record.impact_factor {
            groups
                .entry(record.topic_cluster.as_str())
                .or_default()
                .push(score);
        }
    }

    let mut stats: Vec<ClusterStat> = groups
        .into_iter()
        .map(|(cluster, impact_factors)| ClusterStat {
            topic_cluster: cluster.to_string(),
            publication_count: impact_factors.len(),
            impact_factors,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.publication_count
            .cmp(&a.publication_count)
            .then_with(|| a.topic_cluster.cmp(&b.topic_cluster))
    });
    stats
}

/// `matched / total`, defined as 0 for an empty retrieval.
pub fn match_rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

/// Keep at most `max` points, evenly spaced over the input.
fn thin_points(points: &[f64], max: usize) -> Vec<f64> {
    if points.len() <= max {
        return points.to_vec();
    }
    if max == 0 {
        return Vec::new();
    }
    (0..max).map(|i| points[i * points.len() / max]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cluster: &str, impact_factor: Option<f64>) -> ResultRecord {
        ResultRecord {
            publication_date: "2024-01-01".to_string(),
            title: "Work".to_string(),
            journal_name: "Journal".to_string(),
            topic_cluster: cluster.to_string(),
            doi_identifier: String::new(),
            doi_url: String::new(),
            impact_factor,
        }
    }

    fn records_with_counts(counts: &[(&str, usize)]) -> Vec<ResultRecord> {
        counts
            .iter()
            .flat_map(|(cluster, n)| (0..*n).map(move |i| record(cluster, Some(1.0 + i as f64))))
            .collect()
    }

    #[test]
    fn test_top_n_truncates_chart_view_only() {
        let mut records = records_with_counts(&[("Optics", 3), ("Catalysis", 1), ("Glaucoma", 5)]);
        records.push(record("Glaucoma", None));

        let result = Aggregator::new().aggregate(records, Some(2));

        assert_eq!(result.records.len(), 10);
        assert_eq!(result.cluster_stats.len(), 3);
        assert_eq!(result.chart_clusters.len(), 2);
        assert_eq!(result.chart_clusters[0].topic_cluster, "Glaucoma");
        assert_eq!(result.chart_clusters[0].publication_count, 5);
        assert_eq!(result.chart_clusters[1].topic_cluster, "Optics");
        assert_eq!(result.chart_clusters[1].publication_count, 3);
        assert!((result.match_rate - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_no_top_n_keeps_all_clusters() {
        let records = records_with_counts(&[("A", 1), ("B", 2)]);
        let result = Aggregator::new().aggregate(records, None);
        assert_eq!(result.chart_clusters, result.cluster_stats);

        let records = records_with_counts(&[("A", 1), ("B", 2)]);
        let result = Aggregator::new().aggregate(records, Some(10));
        assert_eq!(result.chart_clusters.len(), 2);
    }

    #[test]
    fn test_ties_break_by_cluster_name() {
        let records = records_with_counts(&[("Zoology", 2), ("Acoustics", 2), ("Botany", 3)]);
        let names: Vec<String> = cluster_stats(&records)
            .into_iter()
            .map(|s| s.topic_cluster)
            .collect();
        assert_eq!(names, vec!["Botany", "Acoustics", "Zoology"]);
    }

    #[test]
    fn test_unmatched_records_are_not_clustered() {
        let records = vec![record("A", None), record("B", Some(2.0)), record("A", None)];
        let result = Aggregator::new().aggregate(records, None);

        assert_eq!(result.enriched_subset.len(), 1);
        assert_eq!(result.cluster_stats.len(), 1);
        assert_eq!(result.cluster_stats[0].topic_cluster, "B");
        assert!((result.match_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let result = Aggregator::new().aggregate(Vec::new(), Some(5));
        assert!(result.is_empty());
        assert!(result.cluster_stats.is_empty());
        assert!(result.chart_clusters.is_empty());
        assert_eq!(result.match_rate, 0.0);
    }

    #[test]
    fn test_no_matches_gives_zero_rate() {
        let records = vec![record("A", None), record("B", None)];
        let result = Aggregator::new().aggregate(records, None);
        assert_eq!(result.match_rate, 0.0);
        assert!(result.enriched_subset.is_empty());
    }

    #[test]
    fn test_record_order_is_preserved() {
        let records = vec![record("B", Some(1.0)), record("A", None), record("C", Some(3.0))];
        let result = Aggregator::new().aggregate(records.clone(), Some(1));
        assert_eq!(result.records, records);
        assert_eq!(result.enriched_subset[0].topic_cluster, "B");
        assert_eq!(result.enriched_subset[1].topic_cluster, "C");
    }

    #[test]
    fn test_points_cap_thins_chart_only() {
        let records = records_with_counts(&[("Dense", 10)]);
        let result = Aggregator::new()
            .with_max_points_per_cluster(Some(4))
            .aggregate(records, None);

        assert_eq!(result.cluster_stats[0].impact_factors.len(), 10);
        assert_eq!(result.chart_clusters[0].publication_count, 10);
        assert_eq!(result.chart_clusters[0].impact_factors, vec![1.0, 3.0, 6.0, 8.0]);
    }

    #[test]
    fn test_match_rate_bounds() {
        assert_eq!(match_rate(0, 0), 0.0);
        assert_eq!(match_rate(0, 7), 0.0);
        assert_eq!(match_rate(7, 7), 1.0);
    }
}
