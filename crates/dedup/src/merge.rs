use std::collections::BTreeMap;

use crate::index::TierIndexes;
use crate::model::{Field, PeopleTable, PersonRecord};
use crate::normalize::{NormalizedRecord, Sentinels};
use crate::report::{MergeCandidates, TierStats};
use crate::tier::Tier;

/// Collapse one cluster into a single record.
///
/// - `key_fields` come from the first member verbatim.
/// - Every other field takes the first member value (record order) whose
///   normalized form is not a sentinel; all-missing yields `""`.
/// - Membership flags are OR-ed; `total_orgs` is the sum of the merged flags.
pub fn merge_cluster(
    records: &[PersonRecord],
    normalized: &[NormalizedRecord],
    members: &[usize],
    key_fields: &[Field],
    sentinels: &Sentinels,
) -> PersonRecord {
    let Some(&first) = members.first() else {
        return PersonRecord::default();
    };

    let mut merged = PersonRecord {
        memberships: vec![0; records[first].memberships.len()],
        ..Default::default()
    };

    for field in Field::ALL {
        let value = if key_fields.contains(&field) {
            records[first].field(field).to_string()
        } else {
            members
                .iter()
                .find(|&&m| sentinels.is_valid(normalized[m].field(field)))
                .map(|&m| records[m].field(field).to_string())
                .unwrap_or_default()
        };
        *merged.field_mut(field) = value;
    }

    for &m in members {
        for (slot, &flag) in merged.memberships.iter_mut().zip(&records[m].memberships) {
            *slot = (*slot).max(flag);
        }
    }
    merged.recount();
    merged
}

/// Output of the tiered merge pass.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: PeopleTable,
    pub candidates: MergeCandidates,
    pub tiers: Vec<TierStats>,
}

/// Emit one record per cluster, tier by tier in precedence order.
/// Singletons and unclassifiable records pass through unchanged.
pub fn merge_tiers(
    table: &PeopleTable,
    normalized: &[NormalizedRecord],
    indexes: &TierIndexes,
    sentinels: &Sentinels,
    separator: &str,
) -> MergeOutcome {
    let records = &table.records;
    let mut out = PeopleTable::new(table.organizations.clone());
    let mut candidates: MergeCandidates = BTreeMap::new();
    let mut stats = Vec::with_capacity(Tier::ALL.len());

    for tier_index in &indexes.tiers {
        let mut tier_stats = TierStats::new(tier_index.tier);
        let key_fields = tier_index.kind.fields();

        for cluster in tier_index.index.clusters() {
            tier_stats.records += cluster.members.len();
            tier_stats.clusters += 1;

            if !cluster.is_duplicate() {
                out.records.push(records[cluster.members[0]].clone());
                continue;
            }

            tier_stats.merged_clusters += 1;
            tier_stats.merged_records += cluster.members.len();
            out.records.push(merge_cluster(
                records,
                normalized,
                &cluster.members,
                key_fields,
                sentinels,
            ));

            candidates
                .entry(tier_index.tier.name().to_string())
                .or_default()
                .insert(
                    cluster.key.encode(separator),
                    cluster.members.iter().map(|&m| table.view(m)).collect(),
                );
        }

        log::info!(
            "{}: {} records, {} clusters merged from {} records",
            tier_index.tier,
            tier_stats.records,
            tier_stats.merged_clusters,
            tier_stats.merged_records
        );
        stats.push(tier_stats);
    }

    let mut other = TierStats::new(Tier::Other);
    for &i in &indexes.passthrough {
        out.records.push(records[i].clone());
        other.records += 1;
        other.clusters += 1;
    }
    stats.push(other);

    MergeOutcome { table: out, candidates, tiers: stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_tier_indexes;
    use crate::key::KeyKind;
    use crate::normalize::normalize_all;
    use proptest::prelude::*;

    fn person(first: &str, last: &str, address: &str, email: &str, phone: &str, flags: &[u8]) -> PersonRecord {
        let mut r = PersonRecord {
            first_name: first.into(),
            last_name: last.into(),
            address: address.into(),
            email: email.into(),
            phone: phone.into(),
            memberships: flags.to_vec(),
            ..Default::default()
        };
        r.recount();
        r
    }

    fn table(orgs: &[&str], records: Vec<PersonRecord>) -> PeopleTable {
        PeopleTable {
            organizations: orgs.iter().map(|s| s.to_string()).collect(),
            records,
        }
    }

    fn run(t: &PeopleTable) -> MergeOutcome {
        let s = Sentinels::default();
        let n = normalize_all(&t.records);
        let idx = build_tier_indexes(&n, &s, 3);
        merge_tiers(t, &n, &idx, &s, "\u{b7}")
    }

    #[test]
    fn first_non_empty_wins_for_free_text() {
        let records = vec![
            person("Jon", "Smith", "", "jon@example.com", "none", &[1, 0]),
            person("Jon", "Smith", "1 Main St", "JON@example.com", "555-1234", &[0, 1]),
        ];
        let n = normalize_all(&records);
        let merged = merge_cluster(&records, &n, &[0, 1], &[Field::Email], &Sentinels::default());
        assert_eq!(merged.address, "1 Main St");
        assert_eq!(merged.phone, "555-1234");
        assert_eq!(merged.email, "jon@example.com");
        assert_eq!(merged.memberships, vec![1, 1]);
        assert_eq!(merged.total_orgs, 2);
    }

    #[test]
    fn key_field_comes_from_first_record_verbatim() {
        let records = vec![
            person("", "", "", "Ann@Example.com", "", &[1]),
            person("Ann", "Lee", "", "ann@example.com", "", &[1]),
        ];
        let n = normalize_all(&records);
        let merged = merge_cluster(&records, &n, &[0, 1], &[Field::Email], &Sentinels::default());
        assert_eq!(merged.email, "Ann@Example.com");
        assert_eq!(merged.first_name, "Ann");
        assert_eq!(merged.total_orgs, 1);
    }

    #[test]
    fn total_is_recomputed_not_carried() {
        let mut a = person("Jon", "Smith", "", "", "5551234", &[1, 0, 0]);
        a.total_orgs = 9;
        let b = person("Jon", "Smith", "", "", "5551234", &[1, 0, 1]);
        let records = vec![a, b];
        let n = normalize_all(&records);
        let fields = KeyKind::NamePhone.fields();
        let merged = merge_cluster(&records, &n, &[0, 1], fields, &Sentinels::default());
        assert_eq!(merged.total_orgs, 2);
    }

    #[test]
    fn singleton_passes_through_unchanged() {
        let mut lone = person(" Mary ", "Jones", "nan", "", "", &[0, 1]);
        lone.total_orgs = 5;
        let t = table(&["A", "B"], vec![lone.clone()]);
        let out = run(&t);
        assert_eq!(out.table.records, vec![lone]);
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn jon_and_john_merge_on_name_phone() {
        let t = table(
            &["X", "Y"],
            vec![
                person("Jon", "Smith", "", "", "555-1234", &[1, 0]),
                person("John", "Smith", "", "", "5551234", &[0, 1]),
            ],
        );
        let out = run(&t);
        assert_eq!(out.table.len(), 1);
        let merged = &out.table.records[0];
        assert_eq!(merged.first_name, "Jon");
        assert_eq!(merged.phone, "555-1234");
        assert_eq!(merged.memberships, vec![1, 1]);
        assert_eq!(merged.total_orgs, 2);

        let cluster = &out.candidates["name_phone"]["jon smith\u{b7}5551234"];
        assert_eq!(cluster.len(), 2);
        assert_eq!(cluster[1].first_name, "John");
    }

    #[test]
    fn output_follows_tier_order() {
        let t = table(
            &["A"],
            vec![
                person("Zed", "", "", "", "", &[1]),
                person("Ann", "Lee", "", "", "5550000", &[1]),
                person("Bob", "Ray", "", "bob@example.com", "", &[1]),
            ],
        );
        let out = run(&t);
        let firsts: Vec<&str> = out.table.records.iter().map(|r| r.first_name.as_str()).collect();
        assert_eq!(firsts, vec!["Bob", "Ann", "Zed"]);
        let other = out.tiers.last().unwrap();
        assert_eq!(other.tier, Tier::Other);
        assert_eq!(other.records, 1);
    }

    #[test]
    fn sentinel_emails_never_cluster() {
        let t = table(
            &["A", "B"],
            vec![
                person("", "", "", "none", "", &[1, 0]),
                person("", "", "", "none", "", &[0, 1]),
            ],
        );
        let out = run(&t);
        assert_eq!(out.table.len(), 2);
        assert!(out.candidates.is_empty());
    }

    fn arb_flags(width: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(0u8..=1, width)
    }

    proptest! {
        #[test]
        fn merged_flags_are_or_and_total_is_sum(
            flags in prop::collection::vec(arb_flags(4), 2..6),
        ) {
            let records: Vec<PersonRecord> = flags
                .iter()
                .map(|f| person("Jon", "Smith", "", "jon@example.com", "", f))
                .collect();
            let members: Vec<usize> = (0..records.len()).collect();
            let n = normalize_all(&records);
            let merged = merge_cluster(&records, &n, &members, &[Field::Email], &Sentinels::default());
            for col in 0..4 {
                let expected = flags.iter().map(|f| f[col]).max().unwrap();
                prop_assert_eq!(merged.memberships[col], expected);
            }
            prop_assert_eq!(merged.total_orgs, merged.memberships.iter().map(|&f| f as u32).sum::<u32>());
        }
    }
}
