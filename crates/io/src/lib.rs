// File I/O for the rollcall pipeline

pub mod json;
pub mod orgs;
pub mod roster;
pub mod table;
pub mod xlsx;

/// Spreadsheet extensions the convert stage picks up.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls", "ods"];
