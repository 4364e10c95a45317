use serde::Serialize;

use crate::config::{
    CELL_PHONE, EMAIL_ADDRESS, FIRST_NAME, LAST_NAME, PHYSICAL_ADDRESS, TOTAL_ORGS, ZIP_CODE,
};
use crate::error::DedupError;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// The six contact fields of the output schema, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Address,
    Zip,
    Email,
    Phone,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::FirstName,
        Field::LastName,
        Field::Address,
        Field::Zip,
        Field::Email,
        Field::Phone,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::FirstName => FIRST_NAME,
            Self::LastName => LAST_NAME,
            Self::Address => PHYSICAL_ADDRESS,
            Self::Zip => ZIP_CODE,
            Self::Email => EMAIL_ADDRESS,
            Self::Phone => CELL_PHONE,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One person as seen on one or more rosters. Values are display values;
/// matching works on [`crate::normalize::NormalizedRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonRecord {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
    /// One 0/1 flag per organization of the owning table, same order.
    pub memberships: Vec<u8>,
    pub total_orgs: u32,
}

impl PersonRecord {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Address => &self.address,
            Field::Zip => &self.zip,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Address => &mut self.address,
            Field::Zip => &mut self.zip,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
        }
    }

    /// Sum of the membership flags.
    pub fn flag_total(&self) -> u32 {
        self.memberships.iter().map(|&f| f as u32).sum()
    }

    pub fn recount(&mut self) {
        self.total_orgs = self.flag_total();
    }

    /// Cells in output column order.
    pub fn to_row(&self) -> Vec<String> {
        let mut row: Vec<String> = Field::ALL.iter().map(|f| self.field(*f).to_string()).collect();
        row.extend(self.memberships.iter().map(|f| f.to_string()));
        row.push(self.total_orgs.to_string());
        row
    }
}

/// Report-friendly view of a record: contact fields plus the organizations it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Physical Address")]
    pub address: String,
    #[serde(rename = "Zip Code")]
    pub zip: String,
    #[serde(rename = "Email Address")]
    pub email: String,
    #[serde(rename = "Cell Phone Number")]
    pub phone: String,
    pub organizations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The people table: a fixed organization set and one record per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeopleTable {
    pub organizations: Vec<String>,
    pub records: Vec<PersonRecord>,
}

impl PeopleTable {
    pub fn new(organizations: Vec<String>) -> Self {
        Self { organizations, records: Vec::new() }
    }

    /// `First Name, Last Name, Physical Address, Zip Code, Email Address,
    /// Cell Phone Number, <orgs...>, Total Orgs`.
    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = Field::ALL.iter().map(|f| f.header().to_string()).collect();
        headers.extend(self.organizations.iter().cloned());
        headers.push(TOTAL_ORGS.to_string());
        headers
    }

    pub fn push(&mut self, record: PersonRecord) -> Result<(), DedupError> {
        if record.memberships.len() != self.organizations.len() {
            let row = record.to_row();
            return Err(DedupError::RowShape {
                expected: self.organizations.len() + Field::ALL.len() + 1,
                found: row.len(),
                row,
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.records.iter().map(|r| r.to_row())
    }

    pub fn view(&self, index: usize) -> RecordView {
        let r = &self.records[index];
        RecordView {
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            address: r.address.clone(),
            zip: r.zip.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
            organizations: self
                .organizations
                .iter()
                .zip(&r.memberships)
                .filter(|&(_, &flag)| flag == 1)
                .map(|(org, _)| org.clone())
                .collect(),
        }
    }

    /// Recompute every record's `Total Orgs` from its flags.
    pub fn recount_totals(&mut self) {
        for record in &mut self.records {
            record.recount();
        }
    }

    /// Rebuild a table from a header row and data rows in the output schema.
    /// A row whose field count differs from the header is fatal.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<String>>) -> Result<Self, DedupError> {
        let contact_cols = Field::ALL.len();
        for (i, field) in Field::ALL.iter().enumerate() {
            if headers.get(i).map(|h| h.as_str()) != Some(field.header()) {
                return Err(DedupError::MissingColumn {
                    origin: "people table".into(),
                    column: field.header().into(),
                });
            }
        }
        if headers.len() <= contact_cols || headers.last().map(|h| h.as_str()) != Some(TOTAL_ORGS) {
            return Err(DedupError::MissingColumn {
                origin: "people table".into(),
                column: TOTAL_ORGS.into(),
            });
        }

        let organizations = headers[contact_cols..headers.len() - 1].to_vec();
        let mut table = PeopleTable::new(organizations);
        table.records.reserve(rows.len());

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                log::error!("malformed row {}: {:?}", row_idx + 1, row);
                return Err(DedupError::RowShape {
                    expected: headers.len(),
                    found: row.len(),
                    row,
                });
            }

            let mut record = PersonRecord::default();
            for (i, field) in Field::ALL.iter().enumerate() {
                *record.field_mut(*field) = row[i].clone();
            }
            record.memberships = row[contact_cols..row.len() - 1]
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    parse_flag(cell).ok_or_else(|| DedupError::FlagParse {
                        row: row_idx + 1,
                        column: table.organizations[j].clone(),
                        value: cell.clone(),
                    })
                })
                .collect::<Result<_, _>>()?;

            let total_cell = &row[row.len() - 1];
            record.total_orgs = match parse_count(total_cell) {
                Some(n) => n,
                None => {
                    log::warn!(
                        "row {}: unreadable {TOTAL_ORGS} '{total_cell}', recounting",
                        row_idx + 1
                    );
                    record.flag_total()
                }
            };
            table.records.push(record);
        }

        Ok(table)
    }
}

/// Membership cells are written by spreadsheet tools as `1`, `1.0`, or blank.
fn parse_flag(cell: &str) -> Option<u8> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(0);
    }
    match cell.parse::<f64>().ok()? {
        v if v == 0.0 => Some(0),
        v if v == 1.0 => Some(1),
        _ => None,
    }
}

fn parse_count(cell: &str) -> Option<u32> {
    let v = cell.trim().parse::<f64>().ok()?;
    if v >= 0.0 && v.fract() == 0.0 {
        Some(v as u32)
    } else {
        None
    }
}
