//! Read-only duplicate diagnostics. Nothing here feeds the merge pass.

use crate::index::index_by;
use crate::key::KeyKind;
use crate::model::PeopleTable;
use crate::normalize::{normalize_all, Sentinels};
use crate::report::{DuplicateReport, KeyGroups};

/// Group every record by fuzzy name, by email and by phone independently,
/// keeping groups of two or more whose key is not a sentinel.
pub fn find_duplicates(
    table: &PeopleTable,
    sentinels: &Sentinels,
    fuzzy_threshold: usize,
) -> DuplicateReport {
    let normalized = normalize_all(&table.records);

    let group = |kind: KeyKind| -> KeyGroups {
        index_by(kind, &normalized, sentinels, fuzzy_threshold)
            .duplicates()
            .map(|cluster| {
                let key = cluster.key.components().join(" ");
                let views = cluster.members.iter().map(|&i| table.view(i)).collect();
                (key, views)
            })
            .collect()
    };

    let report = DuplicateReport {
        by_name: group(KeyKind::Name),
        by_email: group(KeyKind::Email),
        by_phone: group(KeyKind::Phone),
    };

    let counts = report.counts();
    log::info!("duplicates by name: {}", counts.by_name);
    log::info!("duplicates by email: {}", counts.by_email);
    log::info!("duplicates by phone: {}", counts.by_phone);
    report
}
