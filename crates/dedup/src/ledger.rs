//! People ledger: exact identity key → organizations, and its expansion into
//! the people table.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::{extract_zip, AddressTagger};
use crate::config::SchemaConfig;
use crate::error::DedupError;
use crate::model::{Field, PeopleTable, PersonRecord};
use crate::normalize::normalize_field;

/// Entries between progress lines during table assembly.
const PROGRESS_EVERY: usize = 10_000;

/// Identity columns in key order: first, last, address, email, phone.
const KEY_FIELDS: [Field; 5] = [
    Field::FirstName,
    Field::LastName,
    Field::Address,
    Field::Email,
    Field::Phone,
];

/// One loaded roster: the organization's name, its header row and data rows.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub organization: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Roster {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Required columns this roster lacks.
    pub fn missing_columns(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|c| self.column(c).is_none())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: String,
    /// First-seen order, no repeats.
    pub organizations: Vec<String>,
}

/// Identity key → organizations, kept in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleLedger {
    entries: Vec<LedgerEntry>,
    positions: HashMap<String, usize>,
}

impl PeopleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `key` appears on `organization`. Repeats are ignored.
    pub fn record(&mut self, key: String, organization: &str) {
        match self.positions.get(&key) {
            Some(&pos) => {
                let orgs = &mut self.entries[pos].organizations;
                if !orgs.iter().any(|o| o == organization) {
                    orgs.push(organization.to_string());
                }
            }
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push(LedgerEntry {
                    key,
                    organizations: vec![organization.to_string()],
                });
            }
        }
    }

    /// Join identity values into an exact key. NaN-like cells become empty,
    /// everything else is kept trimmed with its original case.
    pub fn identity_key<S: AsRef<str>>(values: &[S], separator: &str) -> String {
        values
            .iter()
            .map(|v| {
                let v = v.as_ref();
                if normalize_field(v).is_empty() {
                    ""
                } else {
                    v.trim()
                }
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.positions.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PeopleLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.organizations)?;
        }
        map.end()
    }
}

struct LedgerVisitor;

impl<'de> Visitor<'de> for LedgerVisitor {
    type Value = PeopleLedger;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of identity key to organization list")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PeopleLedger, A::Error> {
        let mut ledger = PeopleLedger::new();
        while let Some((key, orgs)) = access.next_entry::<String, Vec<String>>()? {
            for org in &orgs {
                ledger.record(key.clone(), org);
            }
        }
        Ok(ledger)
    }
}

impl<'de> Deserialize<'de> for PeopleLedger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LedgerVisitor)
    }
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Add every row of `roster` to the ledger. Returns `false` (and records
/// nothing) when the roster lacks a required column.
pub fn ingest_roster(ledger: &mut PeopleLedger, roster: &Roster, schema: &SchemaConfig) -> bool {
    let missing = roster.missing_columns(&schema.required_columns);
    if !missing.is_empty() {
        log::warn!(
            "skipping org {}: missing columns {:?}",
            roster.organization,
            missing
        );
        return false;
    }

    log::info!("processing org: {}", roster.organization);
    let columns: Vec<Option<usize>> = schema.columns.iter().map(|c| roster.column(c)).collect();

    for row in &roster.rows {
        let values: Vec<&str> = columns
            .iter()
            .map(|col| col.and_then(|i| row.get(i)).map(|s| s.as_str()).unwrap_or(""))
            .collect();
        let key = PeopleLedger::identity_key(&values, &schema.key_separator);
        ledger.record(key, &roster.organization);
    }
    true
}

// ---------------------------------------------------------------------------
// Table assembly
// ---------------------------------------------------------------------------

/// Expand the ledger into the people table: one record per identity key,
/// a flag per organization and a derived ZIP code.
///
/// A key that does not split into exactly five fields is fatal; a separator
/// inside a source value would silently shift every column otherwise.
pub fn assemble_table(
    ledger: &PeopleLedger,
    organizations: &[String],
    separator: &str,
    tagger: &dyn AddressTagger,
) -> Result<PeopleTable, DedupError> {
    let org_positions: HashMap<&str, usize> = organizations
        .iter()
        .enumerate()
        .map(|(i, o)| (o.as_str(), i))
        .collect();

    let total = ledger.len();
    let mut records = Vec::with_capacity(total);

    for (i, entry) in ledger.entries().iter().enumerate() {
        if i % PROGRESS_EVERY == 0 && i > 0 {
            log::info!(
                "[{}] {} / {}, {:.1}% complete",
                chrono::Local::now().format("%H:%M"),
                i,
                total,
                i as f64 * 100.0 / total as f64
            );
        }

        let values: Vec<&str> = entry.key.split(separator).collect();
        if values.len() != KEY_FIELDS.len() {
            let row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            log::error!("malformed row: {row:?}");
            return Err(DedupError::RowShape {
                expected: KEY_FIELDS.len(),
                found: row.len(),
                row,
            });
        }

        let mut record = PersonRecord {
            memberships: vec![0; organizations.len()],
            ..Default::default()
        };
        for (field, value) in KEY_FIELDS.iter().zip(&values) {
            *record.field_mut(*field) = value.to_string();
        }
        record.zip = extract_zip(tagger, &record.address);

        for org in &entry.organizations {
            let pos = org_positions
                .get(org.as_str())
                .ok_or_else(|| DedupError::UnknownOrganization(org.clone()))?;
            record.memberships[*pos] = 1;
        }
        record.recount();
        records.push(record);
    }

    log::info!("assembled {} people across {} organizations", total, organizations.len());
    Ok(PeopleTable { organizations: organizations.to_vec(), records })
}
