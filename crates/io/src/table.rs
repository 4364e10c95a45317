// People table CSV

use std::path::Path;

use rollcall_dedup::PeopleTable;

use crate::roster::read_file_as_utf8;

/// Header row plus data rows, unvalidated. Rows keep their own width so a
/// ragged file reaches `PeopleTable::from_rows` and fails there with the row.
pub fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), String> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("{}: {}", path.display(), e))?;
        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        if i == 0 {
            headers = fields.iter().map(|h| h.trim().to_string()).collect();
        } else {
            rows.push(fields);
        }
    }
    Ok((headers, rows))
}

pub fn write_table(path: &Path, table: &PeopleTable) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("{}: {}", parent.display(), e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    writer
        .write_record(table.headers())
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    for row in table.rows() {
        writer
            .write_record(&row)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    writer.flush().map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(())
}
