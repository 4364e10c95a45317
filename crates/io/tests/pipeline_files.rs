//! File-level pipeline: roster CSVs on disk → ledger JSON → people CSV → merged CSV.

use std::fs;

use rollcall_dedup::config::SchemaConfig;
use rollcall_dedup::ledger::{assemble_table, ingest_roster};
use rollcall_dedup::{DedupError, PatternTagger, PeopleLedger, PeopleTable, RollcallConfig};
use rollcall_io::json::{read_json, write_json};
use rollcall_io::orgs::{discover_organizations, read_list, write_list};
use rollcall_io::roster::read_roster;
use rollcall_io::table::{read_rows, write_table};
use tempfile::tempdir;

const HEADER: &str = "First Name,Last Name,Physical Address,Email Address,Cell Phone Number\n";

#[test]
fn rosters_to_merged_table() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    fs::create_dir_all(&out).unwrap();
    fs::write(
        out.join("Chess.csv"),
        format!("{HEADER}Jon,Smith,,,555-1234\nAnn,Lee,\"2 Elm St, Salem, MA 01970\",,\n"),
    )
    .unwrap();
    fs::write(out.join("Choir.csv"), format!("{HEADER}John,Smith,,,5551234\n")).unwrap();
    fs::write(out.join("Loose.csv"), "Name,Phone\nX,1\n").unwrap();

    let orgs = discover_organizations(dir.path(), &out, &["all_people.csv"]).unwrap();
    assert_eq!(orgs, vec!["Chess", "Choir", "Loose"]);
    write_list(&out.join("org_names.txt"), &orgs).unwrap();

    let schema = SchemaConfig::default();
    let mut ledger = PeopleLedger::new();
    let mut valid = Vec::new();
    for org in read_list(&out.join("org_names.txt")).unwrap() {
        let roster = read_roster(&out.join(format!("{org}.csv")), &org).unwrap();
        if ingest_roster(&mut ledger, &roster, &schema) {
            valid.push(org);
        }
    }
    assert_eq!(valid, vec!["Chess", "Choir"]);

    write_json(&out.join("all_people.json"), &ledger).unwrap();
    let ledger: PeopleLedger = read_json(&out.join("all_people.json")).unwrap();

    let table = assemble_table(&ledger, &valid, &schema.key_separator, &PatternTagger).unwrap();
    let people_csv = out.join("all_people.csv");
    write_table(&people_csv, &table).unwrap();

    let (headers, rows) = read_rows(&people_csv).unwrap();
    let reread = PeopleTable::from_rows(&headers, rows).unwrap();
    assert_eq!(reread, table);
    assert_eq!(reread.records[1].zip, "01970");

    let result = rollcall_dedup::run(&RollcallConfig::default(), &reread).unwrap();
    assert_eq!(result.merged.len(), 2);
    let merged_csv = out.join("merged_people.csv");
    write_table(&merged_csv, &result.merged).unwrap();

    let text = fs::read_to_string(&merged_csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "First Name,Last Name,Physical Address,Zip Code,Email Address,Cell Phone Number,Chess,Choir,Total Orgs"
    );
    assert!(text.contains("Jon,Smith,,,,555-1234,1,1,2"));
}

#[test]
fn ragged_people_csv_is_a_row_shape_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("all_people.csv");
    fs::write(
        &path,
        "First Name,Last Name,Physical Address,Zip Code,Email Address,Cell Phone Number,A,Total Orgs\n\
         Jon,Smith,,,,555,1\n",
    )
    .unwrap();
    let (headers, rows) = read_rows(&path).unwrap();
    let err = PeopleTable::from_rows(&headers, rows).unwrap_err();
    assert!(matches!(err, DedupError::RowShape { expected: 8, found: 7, .. }));
}
