//! Field canonicalization for matching keys.
//!
//! Every function here is pure and idempotent: feeding a normalized value back in
//! returns it unchanged. Malformed input never fails, it degrades to the empty string.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::config::{MatchConfig, DEFAULT_SENTINELS};
use crate::model::{Field, PersonRecord};

/// Spreadsheet renderings of an absent cell.
const MISSING: &[&str] = &["nan", "null"];

/// Trim, lowercase, and map missing-value markers to `""`.
pub fn normalize_field(raw: &str) -> String {
    let value = raw.trim().to_lowercase();
    if MISSING.contains(&value.as_str()) {
        String::new()
    } else {
        value
    }
}

/// [`normalize_field`], then drop `- ( ) +` and whitespace and trim surrounding
/// punctuation, so `(555) 123-4567` and `555-1234567` agree.
pub fn normalize_phone(raw: &str) -> String {
    let value = normalize_field(raw);
    let stripped: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | '(' | ')' | '+') && !c.is_whitespace())
        .collect();
    let trimmed = stripped.trim_matches(|c: char| c.is_ascii_punctuation());
    if MISSING.contains(&trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Sentinels
// ---------------------------------------------------------------------------

/// Values that count as missing data and never form a matching key.
/// Comparison ignores case and whitespace, so `No Call` and `nocall` both hit.
#[derive(Debug, Clone)]
pub struct Sentinels {
    compact: HashSet<String>,
}

fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl Sentinels {
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        let mut compact_set: HashSet<String> = values.iter().map(|v| compact(v.as_ref())).collect();
        compact_set.insert(String::new());
        Self { compact: compact_set }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(&config.sentinels)
    }

    pub fn is_sentinel(&self, value: &str) -> bool {
        self.compact.contains(&compact(value))
    }

    /// True when `value` can take part in a matching key.
    pub fn is_valid(&self, value: &str) -> bool {
        !self.is_sentinel(value)
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINELS)
    }
}

static DEFAULT_SET: Lazy<Sentinels> = Lazy::new(Sentinels::default);

/// Check against the built-in sentinel list.
pub fn is_sentinel(value: &str) -> bool {
    DEFAULT_SET.is_sentinel(value)
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

/// Matching view of a [`PersonRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRecord {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
}

impl NormalizedRecord {
    pub fn from_record(record: &PersonRecord) -> Self {
        Self {
            first_name: normalize_field(&record.first_name),
            last_name: normalize_field(&record.last_name),
            address: normalize_field(&record.address),
            zip: normalize_field(&record.zip),
            email: normalize_field(&record.email),
            phone: normalize_phone(&record.phone),
        }
    }

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

    /// `first last`, trimmed so a record with neither name yields `""`.
    pub fn name_key(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

pub fn normalize_all(records: &[PersonRecord]) -> Vec<NormalizedRecord> {
    records.iter().map(NormalizedRecord::from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn field_trims_and_lowercases() {
        assert_eq!(normalize_field("  Jon  "), "jon");
        assert_eq!(normalize_field("JON@Example.COM"), "jon@example.com");
    }

    #[test]
    fn field_missing_markers_become_empty() {
        assert_eq!(normalize_field("NaN"), "");
        assert_eq!(normalize_field(" null "), "");
        assert_eq!(normalize_field(""), "");
    }

    #[test]
    fn field_keeps_key_sentinels() {
        // Key-level sentinels are filtered by `Sentinels`, not erased here.
        assert_eq!(normalize_field("None"), "none");
        assert_eq!(normalize_field("N/A"), "n/a");
    }

    #[test]
    fn phone_strips_formatting() {
        assert_eq!(normalize_phone("555-1234"), "5551234");
        assert_eq!(normalize_phone("(617) 555-1234"), "6175551234");
        assert_eq!(normalize_phone("+1 617 555 1234"), "16175551234");
        assert_eq!(normalize_phone(" 555-1234. "), "5551234");
    }

    #[test]
    fn phone_missing_marker_inside_punctuation() {
        assert_eq!(normalize_phone("(nan)"), "");
    }

    #[test]
    fn sentinels_ignore_case_and_spacing() {
        let s = Sentinels::default();
        assert!(s.is_sentinel(""));
        assert!(s.is_sentinel("No Call"));
        assert!(s.is_sentinel("nocall"));
        assert!(s.is_sentinel(&normalize_phone("null, null")));
        assert!(s.is_sentinel("N/A"));
        assert!(!s.is_sentinel("5551234"));
        assert!(s.is_valid("jon@example.com"));
        assert!(is_sentinel(" X "));
    }

    #[test]
    fn custom_sentinels_always_include_empty() {
        let s = Sentinels::new(&["unknown"]);
        assert!(s.is_sentinel(""));
        assert!(s.is_sentinel("Unknown"));
        assert!(!s.is_sentinel("none"));
    }

    #[test]
    fn name_key_of_nameless_record_is_empty() {
        let n = NormalizedRecord::default();
        assert_eq!(n.name_key(), "");
        let n = NormalizedRecord { first_name: "jon".into(), ..Default::default() };
        assert_eq!(n.name_key(), "jon");
    }

    fn config() -> ProptestConfig {
        ProptestConfig {
            cases: std::env::var("PROPTEST_CASES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
            failure_persistence: None,
            ..ProptestConfig::default()
        }
    }

    proptest! {
        #![proptest_config(config())]

        #[test]
        fn field_normalization_is_idempotent(raw in r"[ \tA-Za-z0-9@.\-()+,/]{0,24}") {
            let once = normalize_field(&raw);
            prop_assert_eq!(normalize_field(&once), once.clone());
        }

        #[test]
        fn phone_normalization_is_idempotent(raw in r"[ \-()+.0-9a-zA-Z,]{0,20}") {
            let once = normalize_phone(&raw);
            prop_assert_eq!(normalize_phone(&once), once.clone());
        }
    }
}
