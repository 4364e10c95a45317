// Organization name lists

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::xlsx::list_workbooks;

fn stems(paths: &[PathBuf]) -> BTreeSet<String> {
    paths
        .iter()
        .filter_map(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .collect()
}

fn list_csvs(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let pattern = dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    glob::glob(&pattern)
        .map_err(|e| format!("bad pattern {pattern}: {e}"))?
        .map(|entry| entry.map_err(|e| e.to_string()))
        .collect()
}

/// Organization names, sorted and unique: the stems of the workbooks in
/// `input_dir`, or when there are none, of the CSVs in `output_dir` other
/// than the files named in `exclude`.
pub fn discover_organizations(
    input_dir: &Path,
    output_dir: &Path,
    exclude: &[&str],
) -> Result<Vec<String>, String> {
    let workbooks = list_workbooks(input_dir)?;
    if !workbooks.is_empty() {
        return Ok(stems(&workbooks).into_iter().collect());
    }

    let csvs: Vec<PathBuf> = list_csvs(output_dir)?
        .into_iter()
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy().into_owned());
            !name.is_some_and(|n| exclude.contains(&n.as_str()))
        })
        .collect();
    Ok(stems(&csvs).into_iter().collect())
}

/// One entry per non-blank line.
pub fn read_list(path: &Path) -> Result<Vec<String>, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect())
}

pub fn write_list(path: &Path, items: &[String]) -> Result<(), String> {
    let mut content = items.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|e| format!("{}: {}", path.display(), e))
}
