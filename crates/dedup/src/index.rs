use std::collections::HashMap;

use crate::fuzzy::FuzzyKeyIndex;
use crate::key::{KeyKind, MatchKey};
use crate::normalize::{NormalizedRecord, Sentinels};
use crate::tier::Tier;

/// Records sharing one key, as indices into the record slice, in record order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub key: MatchKey,
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }
}

/// Key → cluster, iterated in order of each key's first appearance.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    clusters: Vec<Cluster>,
    positions: HashMap<MatchKey, usize>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MatchKey, record: usize) {
        match self.positions.get(&key) {
            Some(&pos) => self.clusters[pos].members.push(record),
            None => {
                self.positions.insert(key.clone(), self.clusters.len());
                self.clusters.push(Cluster { key, members: vec![record] });
            }
        }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Clusters with two or more members.
    pub fn duplicates(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.is_duplicate())
    }

    pub fn get(&self, key: &MatchKey) -> Option<&Cluster> {
        self.positions.get(key).map(|&pos| &self.clusters[pos])
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Index every record under `kind`; records without a valid key are left out.
pub fn index_by(
    kind: KeyKind,
    records: &[NormalizedRecord],
    sentinels: &Sentinels,
    fuzzy_threshold: usize,
) -> KeyIndex {
    let mut names = FuzzyKeyIndex::new(fuzzy_threshold);
    let mut index = KeyIndex::new();
    for (i, record) in records.iter().enumerate() {
        if let Some(key) = kind.build(record, sentinels, &mut names) {
            index.insert(key, i);
        }
    }
    index
}

// ---------------------------------------------------------------------------
// Tiered indexing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TierIndex {
    pub tier: Tier,
    pub kind: KeyKind,
    pub index: KeyIndex,
}

/// Each record's tier plus one key index per clustering tier.
#[derive(Debug, Clone)]
pub struct TierIndexes {
    pub assignments: Vec<Tier>,
    /// In precedence order, `Other` excluded.
    pub tiers: Vec<TierIndex>,
    /// `Other` records, in record order.
    pub passthrough: Vec<usize>,
}

/// Classify every record and place it in exactly one index, the one its tier keys on.
/// Each tier folds names through its own fuzzy index.
pub fn build_tier_indexes(
    records: &[NormalizedRecord],
    sentinels: &Sentinels,
    fuzzy_threshold: usize,
) -> TierIndexes {
    let assignments: Vec<Tier> = records
        .iter()
        .map(|r| Tier::classify(r, sentinels))
        .collect();

    let mut tiers = Vec::new();
    let mut passthrough = Vec::new();

    for tier in Tier::ALL {
        let Some(kind) = tier.key_kind() else {
            passthrough.extend(
                assignments
                    .iter()
                    .enumerate()
                    .filter(|&(_, &t)| t == tier)
                    .map(|(i, _)| i),
            );
            continue;
        };

        let mut names = FuzzyKeyIndex::new(fuzzy_threshold);
        let mut index = KeyIndex::new();
        for (i, record) in records.iter().enumerate() {
            if assignments[i] != tier {
                continue;
            }
            match kind.build(record, sentinels, &mut names) {
                Some(key) => index.insert(key, i),
                // Unreachable for a correctly classified record; keep it visible anyway.
                None => passthrough.push(i),
            }
        }
        log::debug!(
            "tier {tier}: {} keys, {} duplicate clusters",
            index.len(),
            index.duplicates().count()
        );
        tiers.push(TierIndex { tier, kind, index });
    }

    TierIndexes { assignments, tiers, passthrough }
}
