//! Pipeline stages, one per subcommand. Every stage reads its inputs from and
//! writes its artifacts to the configured output directory.

use std::path::{Path, PathBuf};

use rollcall_dedup::engine::{duplicates, fill_zip_codes};
use rollcall_dedup::ledger::{assemble_table, ingest_roster};
use rollcall_dedup::report::{MergeSummary, RunMeta};
use rollcall_dedup::{PatternTagger, PeopleLedger, PeopleTable, RollcallConfig};
use rollcall_io::json::{read_json, write_json};
use rollcall_io::orgs::{discover_organizations, read_list, write_list};
use rollcall_io::roster::{read_headers, read_roster};
use rollcall_io::table::{read_rows, write_table};
use rollcall_io::xlsx::convert_dir;
use serde::Serialize;

use crate::CliError;

fn output_dir(config: &RollcallConfig) -> Result<PathBuf, CliError> {
    let dir = config.paths.output_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;
    Ok(dir)
}

/// Usage error pointing at `stage` when its artifact is missing.
fn require(path: &Path, stage: &str) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::usage(format!("{} not found", path.display()))
            .with_hint(format!("run `rollcall {stage}` first")))
    }
}

fn roster_path(dir: &Path, org: &str) -> PathBuf {
    dir.join(format!("{org}.csv"))
}

fn load_table(path: &Path) -> Result<PeopleTable, CliError> {
    let (headers, rows) = read_rows(path).map_err(CliError::io)?;
    PeopleTable::from_rows(&headers, rows).map_err(CliError::dedup)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{text}");
    Ok(())
}

// ============================================================================
// convert
// ============================================================================

pub fn cmd_convert(config: &RollcallConfig) -> Result<(), CliError> {
    let out = output_dir(config)?;
    let report = convert_dir(&config.paths.input_dir, &out).map_err(CliError::io)?;
    eprintln!(
        "converted {} workbooks, skipped {} already converted",
        report.converted.len(),
        report.skipped.len()
    );
    Ok(())
}

// ============================================================================
// orgs
// ============================================================================

pub fn cmd_orgs(config: &RollcallConfig) -> Result<(), CliError> {
    let out = output_dir(config)?;
    let paths = &config.paths;
    let exclude = [paths.people_csv.as_str(), paths.merged_csv.as_str()];
    let orgs = discover_organizations(&paths.input_dir, &out, &exclude).map_err(CliError::io)?;
    if orgs.is_empty() {
        log::warn!("no rosters found in {} or {}", paths.input_dir.display(), out.display());
    }

    let list = paths.artifact(&paths.org_names);
    write_list(&list, &orgs).map_err(CliError::io)?;
    eprintln!("{} organizations -> {}", orgs.len(), list.display());
    Ok(())
}

// ============================================================================
// columns
// ============================================================================

pub fn cmd_columns(config: &RollcallConfig) -> Result<(), CliError> {
    let out = output_dir(config)?;
    let list = config.paths.artifact(&config.paths.org_names);
    require(&list, "orgs")?;

    let required = &config.schema.required_columns;
    let mut incomplete = 0;
    for org in read_list(&list).map_err(CliError::io)? {
        let path = roster_path(&out, &org);
        let headers = match read_headers(&path) {
            Ok(headers) => headers,
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        };
        if required.iter().any(|c| !headers.iter().any(|h| h == c)) {
            incomplete += 1;
            println!("{org}: {headers:?}");
        }
    }
    eprintln!("{incomplete} organizations lack one of {required:?}");
    Ok(())
}

// ============================================================================
// ingest
// ============================================================================

pub fn cmd_ingest(config: &RollcallConfig) -> Result<(), CliError> {
    let out = output_dir(config)?;
    let paths = &config.paths;
    let list = paths.artifact(&paths.org_names);
    require(&list, "orgs")?;

    let mut ledger = PeopleLedger::new();
    let mut valid = Vec::new();
    for org in read_list(&list).map_err(CliError::io)? {
        let path = roster_path(&out, &org);
        if !path.exists() {
            log::warn!("skipping org {org}: {} not found", path.display());
            continue;
        }
        let roster = read_roster(&path, &org).map_err(CliError::io)?;
        if ingest_roster(&mut ledger, &roster, &config.schema) {
            valid.push(org);
        }
    }

    write_json(&paths.artifact(&paths.people_json), &ledger).map_err(CliError::io)?;
    write_list(&paths.artifact(&paths.valid_orgs), &valid).map_err(CliError::io)?;
    eprintln!("{} people from {} organizations", ledger.len(), valid.len());
    Ok(())
}

// ============================================================================
// export
// ============================================================================

pub fn cmd_export(config: &RollcallConfig) -> Result<(), CliError> {
    let paths = &config.paths;
    let ledger_path = paths.artifact(&paths.people_json);
    let valid_path = paths.artifact(&paths.valid_orgs);
    require(&ledger_path, "ingest")?;
    require(&valid_path, "ingest")?;

    let ledger: PeopleLedger = read_json(&ledger_path).map_err(CliError::io)?;
    let orgs = read_list(&valid_path).map_err(CliError::io)?;
    let table = assemble_table(&ledger, &orgs, &config.schema.key_separator, &PatternTagger)
        .map_err(CliError::dedup)?;

    let out = paths.artifact(&paths.people_csv);
    write_table(&out, &table).map_err(CliError::io)?;
    eprintln!("{} people -> {}", table.len(), out.display());
    Ok(())
}

// ============================================================================
// duplicates
// ============================================================================

pub fn cmd_duplicates(config: &RollcallConfig, json: bool) -> Result<(), CliError> {
    let paths = &config.paths;
    let table_path = paths.artifact(&paths.people_csv);
    require(&table_path, "export")?;

    let table = load_table(&table_path)?;
    let report = duplicates(config, &table);
    write_json(&paths.artifact(&paths.duplicates_json), &report).map_err(CliError::io)?;

    let counts = report.counts();
    eprintln!("Duplicates by name:  {}", counts.by_name);
    eprintln!("Duplicates by email: {}", counts.by_email);
    eprintln!("Duplicates by phone: {}", counts.by_phone);
    if json {
        print_json(&report)?;
    }
    Ok(())
}

// ============================================================================
// dedup
// ============================================================================

#[derive(Serialize)]
struct DedupOutput<'a> {
    meta: &'a RunMeta,
    summary: &'a MergeSummary,
}

pub fn cmd_dedup(config: &RollcallConfig, json: bool) -> Result<(), CliError> {
    let paths = &config.paths;
    let table_path = paths.artifact(&paths.people_csv);
    require(&table_path, "export")?;

    let table = load_table(&table_path)?;
    let result = rollcall_dedup::run(config, &table).map_err(CliError::dedup)?;

    let merged_path = paths.artifact(&paths.merged_csv);
    write_table(&merged_path, &result.merged).map_err(CliError::io)?;
    write_json(&paths.artifact(&paths.candidates_json), &result.candidates)
        .map_err(CliError::io)?;

    print_summary(&result.summary);
    eprintln!("wrote {}", merged_path.display());
    if json {
        print_json(&DedupOutput { meta: &result.meta, summary: &result.summary })?;
    }
    Ok(())
}

fn print_summary(summary: &MergeSummary) {
    eprintln!("{:<14} {:>8} {:>8} {:>8}", "tier", "records", "merged", "output");
    for t in &summary.tiers {
        eprintln!(
            "{:<14} {:>8} {:>8} {:>8}",
            t.tier.name(),
            t.records,
            t.merged_records,
            t.output_records()
        );
    }
    eprintln!(
        "{} records -> {} ({} removed)",
        summary.input_records, summary.output_records, summary.removed
    );
}

// ============================================================================
// recount / zip
// ============================================================================

fn table_arg(config: &RollcallConfig, file: Option<PathBuf>) -> Result<PathBuf, CliError> {
    let path = file.unwrap_or_else(|| config.paths.artifact(&config.paths.people_csv));
    require(&path, "export")?;
    Ok(path)
}

pub fn cmd_recount(config: &RollcallConfig, file: Option<PathBuf>) -> Result<(), CliError> {
    let path = table_arg(config, file)?;
    let mut table = load_table(&path)?;
    let stale = table
        .records
        .iter()
        .filter(|r| r.total_orgs != r.flag_total())
        .count();
    table.recount_totals();
    write_table(&path, &table).map_err(CliError::io)?;
    eprintln!("recounted {} rows ({} corrected)", table.len(), stale);
    Ok(())
}

pub fn cmd_zip(config: &RollcallConfig, file: Option<PathBuf>) -> Result<(), CliError> {
    let path = table_arg(config, file)?;
    let mut table = load_table(&path)?;
    let changed = fill_zip_codes(&mut table, &PatternTagger);
    write_table(&path, &table).map_err(CliError::io)?;
    eprintln!("{} of {} zip codes updated", changed, table.len());
    Ok(())
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(config: &RollcallConfig) -> Result<(), CliError> {
    cmd_orgs(config)?;
    cmd_columns(config)?;
    cmd_ingest(config)?;
    cmd_export(config)?;
    cmd_duplicates(config, false)?;
    cmd_dedup(config, false)
}
