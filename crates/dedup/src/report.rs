use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::RecordView;
use crate::tier::Tier;

/// Tier name → encoded key → pre-merge cluster members.
pub type MergeCandidates = BTreeMap<String, BTreeMap<String, Vec<RecordView>>>;

/// Normalized key → records sharing it.
pub type KeyGroups = BTreeMap<String, Vec<RecordView>>;

/// Suspected duplicates under three independent groupings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    pub by_name: KeyGroups,
    pub by_email: KeyGroups,
    pub by_phone: KeyGroups,
}

impl DuplicateReport {
    pub fn counts(&self) -> DuplicateCounts {
        DuplicateCounts {
            by_name: self.by_name.len(),
            by_email: self.by_email.len(),
            by_phone: self.by_phone.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicateCounts {
    pub by_name: usize,
    pub by_email: usize,
    pub by_phone: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub tier: Tier,
    /// Records assigned to the tier.
    pub records: usize,
    /// Distinct keys (every record of `Other` counts as its own).
    pub clusters: usize,
    /// Clusters with two or more members.
    pub merged_clusters: usize,
    /// Records consumed by those clusters.
    pub merged_records: usize,
}

impl TierStats {
    pub fn new(tier: Tier) -> Self {
        Self { tier, records: 0, clusters: 0, merged_clusters: 0, merged_records: 0 }
    }

    /// Records this tier contributes to the output.
    pub fn output_records(&self) -> usize {
        self.clusters
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub input_records: usize,
    pub output_records: usize,
    pub removed: usize,
    pub tiers: Vec<TierStats>,
}

impl MergeSummary {
    pub fn from_tiers(input_records: usize, tiers: Vec<TierStats>) -> Self {
        let output_records = tiers.iter().map(|t| t.output_records()).sum();
        Self {
            input_records,
            output_records,
            removed: input_records.saturating_sub(output_records),
            tiers,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub fuzzy_threshold: usize,
}
