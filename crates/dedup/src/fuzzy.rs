//! Edit-distance folding of free-text keys.
//!
//! Lookups scan the known keys in first-seen order and fold into the FIRST key
//! within the threshold, not the closest one. Merge output is defined relative to
//! that policy, so changing it is a behavior change.

use std::collections::HashMap;

use strsim::damerau_levenshtein;

/// Known keys in first-seen order. Any two stored keys are at least `threshold`
/// edits apart, which is what lets an exact hit short-circuit the scan.
#[derive(Debug, Clone)]
pub struct FuzzyKeyIndex {
    threshold: usize,
    keys: Vec<String>,
    lengths: Vec<usize>,
    exact: HashMap<String, usize>,
}

impl FuzzyKeyIndex {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            keys: Vec::new(),
            lengths: Vec::new(),
            exact: HashMap::new(),
        }
    }

    /// Position of the first known key within `threshold` edits of `key`.
    pub fn find(&self, key: &str) -> Option<usize> {
        if let Some(&pos) = self.exact.get(key) {
            return Some(pos);
        }
        // Edit distance is at least the length difference.
        let len = key.chars().count();
        self.keys
            .iter()
            .zip(&self.lengths)
            .position(|(known, &known_len)| {
                len.abs_diff(known_len) < self.threshold
                    && damerau_levenshtein(known, key) < self.threshold
            })
    }

    /// The key `key` folds into; unknown keys are registered and returned as-is.
    pub fn resolve(&mut self, key: &str) -> String {
        match self.find(key) {
            Some(pos) => self.keys[pos].clone(),
            None => {
                self.exact.insert(key.to_string(), self.keys.len());
                self.keys.push(key.to_string());
                self.lengths.push(key.chars().count());
                key.to_string()
            }
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_names_fold() {
        let mut idx = FuzzyKeyIndex::new(3);
        assert_eq!(idx.resolve("jon smith"), "jon smith");
        assert_eq!(idx.resolve("john smith"), "jon smith");
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn distant_names_stay_apart() {
        let mut idx = FuzzyKeyIndex::new(3);
        idx.resolve("jon smith");
        assert_eq!(idx.resolve("mary jones"), "mary jones");
        assert_eq!(idx.keys(), &["jon smith".to_string(), "mary jones".to_string()]);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut idx = FuzzyKeyIndex::new(3);
        idx.resolve("abcdef");
        // Three substitutions: distance 3 is not below the threshold.
        assert_eq!(idx.resolve("abcxyz"), "abcxyz");
        // Two substitutions fold.
        assert_eq!(idx.resolve("abcdyz"), "abcdef");
    }

    #[test]
    fn transposition_counts_once() {
        let mut idx = FuzzyKeyIndex::new(2);
        idx.resolve("ann lee");
        assert_eq!(idx.resolve("nan lee"), "ann lee");
    }

    #[test]
    fn first_match_wins_over_closest() {
        let mut idx = FuzzyKeyIndex::new(3);
        idx.resolve("abcde");
        idx.resolve("abxyz"); // 3 edits from "abcde", stays separate
        // 2 edits from "abcde", 1 edit from "abxyz": folds into the earlier key.
        assert_eq!(idx.resolve("abcyz"), "abcde");
    }

    #[test]
    fn length_gap_skips_comparison() {
        let mut idx = FuzzyKeyIndex::new(3);
        idx.resolve("al");
        assert_eq!(idx.resolve("alexander"), "alexander");
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn exact_repeat_returns_same_key() {
        let mut idx = FuzzyKeyIndex::new(3);
        idx.resolve("jon smith");
        idx.resolve("mary jones");
        assert_eq!(idx.find("mary jones"), Some(1));
        assert_eq!(idx.resolve("mary jones"), "mary jones");
        assert_eq!(idx.len(), 2);
    }
}
