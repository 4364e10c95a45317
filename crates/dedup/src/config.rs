use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DedupError;

/// Values that never form a valid matching key, compared after normalization.
pub const DEFAULT_SENTINELS: &[&str] = &[
    "", "none", "nan", "n/a", "y", "no call", "null, null", "x", "nocall",
];

/// Middle dot; never appears in a legitimate name, address, email or phone value.
pub const DEFAULT_KEY_SEPARATOR: &str = "\u{b7}";

pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";
pub const PHYSICAL_ADDRESS: &str = "Physical Address";
pub const ZIP_CODE: &str = "Zip Code";
pub const EMAIL_ADDRESS: &str = "Email Address";
pub const CELL_PHONE: &str = "Cell Phone Number";
pub const TOTAL_ORGS: &str = "Total Orgs";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollcallConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub matching: MatchConfig,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Where rosters live and where every stage writes its artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Defaults to `<input_dir>/output`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_org_names")]
    pub org_names: String,
    #[serde(default = "default_valid_orgs")]
    pub valid_orgs: String,
    #[serde(default = "default_people_json")]
    pub people_json: String,
    #[serde(default = "default_people_csv")]
    pub people_csv: String,
    #[serde(default = "default_duplicates_json")]
    pub duplicates_json: String,
    #[serde(default = "default_merged_csv")]
    pub merged_csv: String,
    #[serde(default = "default_candidates_json")]
    pub candidates_json: String,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("contact-lists")
}
fn default_org_names() -> String {
    "org_names.txt".into()
}
fn default_valid_orgs() -> String {
    "valid_orgs.txt".into()
}
fn default_people_json() -> String {
    "all_people.json".into()
}
fn default_people_csv() -> String {
    "all_people.csv".into()
}
fn default_duplicates_json() -> String {
    "duplicates.json".into()
}
fn default_merged_csv() -> String {
    "merged_people.csv".into()
}
fn default_candidates_json() -> String {
    "merge_candidates.json".into()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: None,
            org_names: default_org_names(),
            valid_orgs: default_valid_orgs(),
            people_json: default_people_json(),
            people_csv: default_people_csv(),
            duplicates_json: default_duplicates_json(),
            merged_csv: default_merged_csv(),
            candidates_json: default_candidates_json(),
        }
    }
}

impl PathsConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join("output"))
    }

    /// Path of an artifact inside the output directory.
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    /// Resolve relative directories against `base` (the config file's directory).
    pub fn rebase(&mut self, base: &Path) {
        if self.input_dir.is_relative() {
            self.input_dir = base.join(&self.input_dir);
        }
        if let Some(ref out) = self.output_dir {
            if out.is_relative() {
                self.output_dir = Some(base.join(out));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Identity columns read from each roster, in key order.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    /// A roster lacking any of these is not a valid organization.
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,
    #[serde(default = "default_key_separator")]
    pub key_separator: String,
}

fn default_columns() -> Vec<String> {
    [FIRST_NAME, LAST_NAME, PHYSICAL_ADDRESS, EMAIL_ADDRESS, CELL_PHONE]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_required_columns() -> Vec<String> {
    vec![FIRST_NAME.to_string(), LAST_NAME.to_string()]
}

fn default_key_separator() -> String {
    DEFAULT_KEY_SEPARATOR.to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            required_columns: default_required_columns(),
            key_separator: default_key_separator(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Name keys closer than this edit distance fold together.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: usize,
    #[serde(default = "default_sentinels")]
    pub sentinels: Vec<String>,
}

fn default_fuzzy_threshold() -> usize {
    3
}

fn default_sentinels() -> Vec<String> {
    DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect()
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            sentinels: default_sentinels(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RollcallConfig {
    pub fn from_toml(input: &str) -> Result<Self, DedupError> {
        let config: RollcallConfig =
            toml::from_str(input).map_err(|e| DedupError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DedupError> {
        let sep = &self.schema.key_separator;
        if sep.is_empty() {
            return Err(DedupError::ConfigValidation(
                "key_separator must not be empty".into(),
            ));
        }
        if sep.chars().any(|c| c.is_alphanumeric() || c.is_whitespace()) {
            return Err(DedupError::ConfigValidation(format!(
                "key_separator '{sep}' must be punctuation"
            )));
        }

        if self.schema.columns.len() != 5 {
            return Err(DedupError::ConfigValidation(format!(
                "schema.columns must name 5 identity columns, got {}",
                self.schema.columns.len()
            )));
        }

        for required in &self.schema.required_columns {
            if !self.schema.columns.contains(required) {
                return Err(DedupError::ConfigValidation(format!(
                    "required column '{required}' is not one of schema.columns"
                )));
            }
        }

        if self.matching.fuzzy_threshold == 0 {
            return Err(DedupError::ConfigValidation(
                "fuzzy_threshold must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RollcallConfig::from_toml("").unwrap();
        assert_eq!(config.paths.input_dir, PathBuf::from("contact-lists"));
        assert_eq!(
            config.paths.output_dir(),
            PathBuf::from("contact-lists").join("output")
        );
        assert_eq!(config.schema.columns[0], FIRST_NAME);
        assert_eq!(config.schema.columns[4], CELL_PHONE);
        assert_eq!(config.schema.key_separator, "\u{b7}");
        assert_eq!(config.matching.fuzzy_threshold, 3);
        assert!(config.matching.sentinels.iter().any(|s| s == "no call"));
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
[paths]
input_dir = "rosters"
output_dir = "out"
merged_csv = "book.csv"

[schema]
key_separator = "|"

[matching]
fuzzy_threshold = 2
sentinels = ["", "unknown"]
"#;
        let config = RollcallConfig::from_toml(input).unwrap();
        assert_eq!(config.paths.output_dir(), PathBuf::from("out"));
        assert_eq!(config.paths.artifact("book.csv"), PathBuf::from("out/book.csv"));
        assert_eq!(config.paths.merged_csv, "book.csv");
        assert_eq!(config.paths.people_csv, "all_people.csv");
        assert_eq!(config.schema.key_separator, "|");
        assert_eq!(config.matching.fuzzy_threshold, 2);
        assert_eq!(config.matching.sentinels, vec!["", "unknown"]);
    }

    #[test]
    fn rebase_relative_dirs() {
        let mut paths = PathsConfig {
            output_dir: Some(PathBuf::from("out")),
            ..PathsConfig::default()
        };
        paths.rebase(Path::new("/srv/run"));
        assert_eq!(paths.input_dir, PathBuf::from("/srv/run/contact-lists"));
        assert_eq!(paths.output_dir(), PathBuf::from("/srv/run/out"));
    }

    #[test]
    fn reject_alphanumeric_separator() {
        let err = RollcallConfig::from_toml("[schema]\nkey_separator = \"a\"\n").unwrap_err();
        assert!(err.to_string().contains("must be punctuation"));
    }

    #[test]
    fn reject_zero_threshold() {
        let err = RollcallConfig::from_toml("[matching]\nfuzzy_threshold = 0\n").unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn reject_unknown_required_column() {
        let input = r#"
[schema]
required_columns = ["First Name", "Badge"]
"#;
        let err = RollcallConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'Badge'"));
    }

    #[test]
    fn reject_unknown_section_key() {
        let err = RollcallConfig::from_toml("[matching]\nthreshold = 3\n");
        assert!(err.is_err(), "typo in key should fail deserialization");
    }
}
