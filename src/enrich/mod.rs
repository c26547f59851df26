//! Impact-factor enrichment.
//!
//! Attaches a journal impact factor to each record through an injected
//! [`ImpactFactorIndex`]. Records without a match are kept with
//! `impact_factor = None`.

use std::sync::Arc;

use tracing::debug;

use crate::impact::ImpactFactorIndex;
use crate::models::ResultRecord;

/// Attaches impact factors to normalized records.
#[derive(Debug, Clone)]
pub struct RecordEnricher {
    index: Arc<ImpactFactorIndex>,
}

impl RecordEnricher {
    /// Create an enricher over a shared index.
    pub fn new(index: Arc<ImpactFactorIndex>) -> Self {
        Self { index }
    }

    /// The index used for lookups.
    pub fn index(&self) -> &ImpactFactorIndex {
        &self.index
    }

    /// Attach an impact factor to each record, preserving order.
    pub fn enrich(&self, records: Vec<ResultRecord>) -> Vec<ResultRecord> {
        let total = records.len();
        let enriched: Vec<ResultRecord> = records
            .into_iter()
            .map(|mut record| {
                record.impact_factor = self.index.lookup(&record.journal_name);
                record
            })
            .collect();

        debug!(
            "Matched impact factors for {}/{} records",
            enriched.iter().filter(|r| r.is_matched()).count(),
            total
        );
        enriched
    }
}
