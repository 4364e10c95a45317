// Roster CSV loading

use std::io::Read;
use std::path::Path;

use rollcall_dedup::Roster;

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel on Windows exports CSV in the system code page
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Load `<path>` as the roster of `organization`. The first row is the header;
/// short rows are kept as-is and read as empty cells downstream.
pub fn read_roster(path: &Path, organization: &str) -> Result<Roster, String> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    parse_roster(content, organization).map_err(|e| format!("{}: {}", path.display(), e))
}

fn parse_roster(content: &str, organization: &str) -> Result<Roster, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(row) => row
            .map_err(|e| e.to_string())?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(Roster {
        organization: organization.to_string(),
        headers,
        rows,
    })
}

/// Header row only, for column diagnostics.
pub fn read_headers(path: &Path) -> Result<Vec<String>, String> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    match reader.records().next() {
        Some(row) => Ok(row
            .map_err(|e| format!("{}: {}", path.display(), e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect()),
        None => Ok(Vec::new()),
    }
}
