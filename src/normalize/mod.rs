//! Normalization of raw works into `ResultRecord`s.
//!
//! Normalization is a total function: it never fails, it substitutes a named
//! default for every missing, null or empty field.

use crate::models::ResultRecord;
use crate::provider::RawItem;

/// Title used when the source has none.
pub const DEFAULT_TITLE: &str = "No Title";

/// Journal name used when the work has no primary source.
pub const DEFAULT_JOURNAL: &str = "Unknown";

/// Cluster used when no concept below the top level is tagged.
pub const DEFAULT_CLUSTER: &str = "Others";

/// Resolver prefixes stripped from DOI links, checked in order.
pub const DOI_RESOLVER_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Convert one raw item into a record without an impact factor.
pub fn normalize(item: &RawItem) -> ResultRecord {
    let doi_url = item.doi().unwrap_or_default().to_string();

    ResultRecord {
        publication_date: item.publication_date().unwrap_or_default().to_string(),
        title: non_empty_or(item.title(), DEFAULT_TITLE),
        journal_name: non_empty_or(item.source_display_name(), DEFAULT_JOURNAL),
        topic_cluster: topic_cluster(item),
        doi_identifier: strip_doi_prefix(&doi_url).to_string(),
        doi_url,
        impact_factor: None,
    }
}

/// Normalize a batch, preserving order.
pub fn normalize_all(items: &[RawItem]) -> Vec<ResultRecord> {
    items.iter().map(normalize).collect()
}

/// Display name of the first concept with level > 0, or the default.
///
/// A qualifying concept without a usable name still ends the scan.
pub fn topic_cluster(item: &RawItem) -> String {
    let concepts = item.concepts();
    let first = concepts.iter().find(|concept| concept.level > 0.0);
    non_empty_or(first.and_then(|concept| concept.display_name), DEFAULT_CLUSTER)
}

/// Strip a leading DOI resolver prefix; anything else is returned unchanged.
pub fn strip_doi_prefix(doi: &str) -> &str {
    let trimmed = doi.trim();
    DOI_RESOLVER_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_item() {
        let item = RawItem::new(json!({
            "publication_date": "2024-06-30",
            "title": "Optic nerve imaging",
            "doi": "https://doi.org/10.1000/xyz",
            "primary_location": {"source": {"display_name": "JAMA Ophthalmology"}},
            "concepts": [
                {"display_name": "Medicine", "level": 0},
                {"display_name": "Glaucoma", "level": 2},
                {"display_name": "Optometry", "level": 1}
            ]
        }));

        let record = normalize(&item);
        assert_eq!(record.publication_date, "2024-06-30");
        assert_eq!(record.title, "Optic nerve imaging");
        assert_eq!(record.journal_name, "JAMA Ophthalmology");
        assert_eq!(record.topic_cluster, "Glaucoma");
        assert_eq!(record.doi_identifier, "10.1000/xyz");
        assert_eq!(record.doi_url, "https://doi.org/10.1000/xyz");
        assert_eq!(record.impact_factor, None);
    }

    #[test]
    fn test_missing_source_yields_unknown_journal() {
        let no_location = RawItem::new(json!({"title": "A"}));
        assert_eq!(normalize(&no_location).journal_name, DEFAULT_JOURNAL);

        let null_source = RawItem::new(json!({"primary_location": {"source": null}}));
        assert_eq!(normalize(&null_source).journal_name, DEFAULT_JOURNAL);

        let null_location = RawItem::new(json!({"primary_location": null}));
        assert_eq!(normalize(&null_location).journal_name, DEFAULT_JOURNAL);
    }

    #[test]
    fn test_level_zero_concepts_yield_others() {
        let item = RawItem::new(json!({
            "concepts": [
                {"display_name": "Computer science", "level": 0},
                {"display_name": "Chemistry", "level": 0}
            ]
        }));
        assert_eq!(normalize(&item).topic_cluster, DEFAULT_CLUSTER);

        let empty = RawItem::new(json!({"concepts": []}));
        assert_eq!(normalize(&empty).topic_cluster, DEFAULT_CLUSTER);
    }

    #[test]
    fn test_nameless_qualifying_concept_yields_others() {
        let item = RawItem::new(json!({
            "concepts": [
                {"level": 1},
                {"display_name": "Catalysis", "level": 2}
            ]
        }));
        assert_eq!(normalize(&item).topic_cluster, DEFAULT_CLUSTER);
    }

    #[test]
    fn test_empty_item_uses_every_default() {
        let record = normalize(&RawItem::new(json!({})));
        assert_eq!(record.publication_date, "");
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.journal_name, DEFAULT_JOURNAL);
        assert_eq!(record.topic_cluster, DEFAULT_CLUSTER);
        assert_eq!(record.doi_identifier, "");
        assert_eq!(record.doi_url, "");
    }

    #[test]
    fn test_null_and_blank_title() {
        let record = normalize(&RawItem::new(json!({"title": null})));
        assert_eq!(record.title, DEFAULT_TITLE);
        let record = normalize(&RawItem::new(json!({"title": "   "})));
        assert_eq!(record.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_title_and_journal_are_kept_verbatim() {
        let record = normalize(&RawItem::new(json!({
            "title": "  Padded Title  ",
            "primary_location": {"source": {"display_name": " Nature "}}
        })));
        assert_eq!(record.title, "  Padded Title  ");
        assert_eq!(record.journal_name, " Nature ");
    }

    #[test]
    fn test_strip_doi_prefix() {
        assert_eq!(strip_doi_prefix("https://doi.org/10.1000/xyz"), "10.1000/xyz");
        assert_eq!(strip_doi_prefix("http://dx.doi.org/10.1/a"), "10.1/a");
        assert_eq!(strip_doi_prefix("doi:10.2/b"), "10.2/b");
        assert_eq!(strip_doi_prefix("10.3/c"), "10.3/c");
        assert_eq!(strip_doi_prefix(""), "");
    }

    #[test]
    fn test_normalize_all_preserves_order() {
        let items = vec![
            RawItem::new(json!({"title": "first"})),
            RawItem::new(json!({"title": "second"})),
        ];
        let titles: Vec<String> = normalize_all(&items).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
