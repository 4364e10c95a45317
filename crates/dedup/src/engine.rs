use crate::address::{extract_zip, AddressTagger};
use crate::config::RollcallConfig;
use crate::duplicates::find_duplicates;
use crate::error::DedupError;
use crate::index::build_tier_indexes;
use crate::merge::merge_tiers;
use crate::model::{Field, PeopleTable};
use crate::normalize::{normalize_all, Sentinels};
use crate::report::{DuplicateReport, MergeCandidates, MergeSummary, RunMeta};

/// Merged table plus everything needed to audit how it was produced.
#[derive(Debug, Clone)]
pub struct DedupResult {
    pub meta: RunMeta,
    pub merged: PeopleTable,
    pub candidates: MergeCandidates,
    pub summary: MergeSummary,
}

/// Run the tiered merge over `table`.
pub fn run(config: &RollcallConfig, table: &PeopleTable) -> Result<DedupResult, DedupError> {
    config.validate()?;
    check_shape(table)?;

    let sentinels = Sentinels::from_config(&config.matching);
    let threshold = config.matching.fuzzy_threshold;

    let normalized = normalize_all(&table.records);
    let indexes = build_tier_indexes(&normalized, &sentinels, threshold);
    let outcome = merge_tiers(
        table,
        &normalized,
        &indexes,
        &sentinels,
        &config.schema.key_separator,
    );

    let summary = MergeSummary::from_tiers(table.len(), outcome.tiers);
    log::info!(
        "merged {} records into {} ({} removed)",
        summary.input_records,
        summary.output_records,
        summary.removed
    );

    Ok(DedupResult {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            fuzzy_threshold: threshold,
        },
        merged: outcome.table,
        candidates: outcome.candidates,
        summary,
    })
}

/// Duplicate diagnostics with the configured sentinels and threshold.
pub fn duplicates(config: &RollcallConfig, table: &PeopleTable) -> DuplicateReport {
    let sentinels = Sentinels::from_config(&config.matching);
    find_duplicates(table, &sentinels, config.matching.fuzzy_threshold)
}

/// Re-derive every record's ZIP code from its address. Returns how many changed.
pub fn fill_zip_codes(table: &mut PeopleTable, tagger: &dyn AddressTagger) -> usize {
    let mut changed = 0;
    for record in &mut table.records {
        let zip = extract_zip(tagger, &record.address);
        if zip != record.zip {
            record.zip = zip;
            changed += 1;
        }
    }
    changed
}

fn check_shape(table: &PeopleTable) -> Result<(), DedupError> {
    let width = table.organizations.len();
    for record in &table.records {
        if record.memberships.len() != width {
            let row = record.to_row();
            log::error!("malformed row: {row:?}");
            return Err(DedupError::RowShape {
                expected: Field::ALL.len() + width + 1,
                found: row.len(),
                row,
            });
        }
    }
    Ok(())
}
