// Spreadsheet → CSV conversion

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::WORKBOOK_EXTENSIONS;

/// Outcome of converting a directory of workbooks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub converted: Vec<PathBuf>,
    /// Workbooks whose CSV already existed.
    pub skipped: Vec<PathBuf>,
}

/// Render one cell as CSV text. Whole floats lose their decimals so phone
/// numbers and ZIP codes stored as numbers survive the trip.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Write the first sheet of `workbook` to `out`. Returns the number of rows written.
pub fn convert_workbook(workbook: &Path, out: &Path) -> Result<usize, String> {
    let mut book: Sheets<_> = open_workbook_auto(workbook)
        .map_err(|e| format!("{}: failed to open workbook: {}", workbook.display(), e))?;

    let sheet_names: Vec<String> = book.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| format!("{}: workbook contains no sheets", workbook.display()))?;
    let range = book
        .worksheet_range(first)
        .map_err(|e| format!("{}: failed to read sheet '{}': {}", workbook.display(), first, e))?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(out)
        .map_err(|e| format!("{}: {}", out.display(), e))?;

    let mut written = 0;
    for row in range.rows() {
        let record: Vec<String> = row.iter().map(cell_to_string).collect();
        writer
            .write_record(&record)
            .map_err(|e| format!("{}: {}", out.display(), e))?;
        written += 1;
    }
    writer.flush().map_err(|e| format!("{}: {}", out.display(), e))?;
    Ok(written)
}

/// Workbooks directly inside `dir`, sorted by path.
pub fn list_workbooks(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut found = Vec::new();
    for ext in WORKBOOK_EXTENSIONS {
        let pattern = dir.join(format!("*.{ext}"));
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern).map_err(|e| format!("bad pattern {pattern}: {e}"))?;
        for entry in paths {
            found.push(entry.map_err(|e| e.to_string())?);
        }
    }
    found.sort();
    Ok(found)
}

/// Convert every workbook in `input_dir` to `<output_dir>/<stem>.csv`,
/// leaving existing CSVs alone.
pub fn convert_dir(input_dir: &Path, output_dir: &Path) -> Result<ConvertReport, String> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("{}: {}", output_dir.display(), e))?;

    let mut report = ConvertReport::default();
    for workbook in list_workbooks(input_dir)? {
        let Some(stem) = workbook.file_stem() else {
            continue;
        };
        let out = output_dir.join(format!("{}.csv", stem.to_string_lossy()));
        if out.exists() {
            log::debug!("{} exists, skipping", out.display());
            report.skipped.push(workbook);
            continue;
        }
        let rows = convert_workbook(&workbook, &out)?;
        log::info!("converted {} ({} rows)", workbook.display(), rows);
        report.converted.push(workbook);
    }
    Ok(report)
}
