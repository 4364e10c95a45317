use crate::fuzzy::FuzzyKeyIndex;
use crate::model::Field;
use crate::normalize::{NormalizedRecord, Sentinels};

/// Normalized field values that group records. Name-based keys carry the
/// fuzzy-resolved `first last` string as their first component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    components: Vec<String>,
}

impl MatchKey {
    pub fn new(components: Vec<String>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// A key is usable only when no component is a sentinel.
    pub fn is_valid(&self, sentinels: &Sentinels) -> bool {
        !self.components.is_empty() && self.components.iter().all(|c| sentinels.is_valid(c))
    }

    /// Single text form, e.g. for report keys and persistence.
    pub fn encode(&self, separator: &str) -> String {
        self.components.join(separator)
    }
}

/// Which fields a key is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Name,
    Email,
    Phone,
    NameAddress,
    NamePhone,
}

impl KeyKind {
    /// Fields that define the key; merges take these from the first record verbatim.
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Self::Name => &[Field::FirstName, Field::LastName],
            Self::Email => &[Field::Email],
            Self::Phone => &[Field::Phone],
            Self::NameAddress => &[Field::FirstName, Field::LastName, Field::Address],
            Self::NamePhone => &[Field::FirstName, Field::LastName, Field::Phone],
        }
    }

    pub fn uses_name(&self) -> bool {
        matches!(self, Self::Name | Self::NameAddress | Self::NamePhone)
    }

    /// Build the key for `record`, or `None` when any component is a sentinel.
    /// The name component is folded through `names` only once the key is known valid,
    /// so sentinel names never enter the fuzzy index.
    pub fn build(
        &self,
        record: &NormalizedRecord,
        sentinels: &Sentinels,
        names: &mut FuzzyKeyIndex,
    ) -> Option<MatchKey> {
        let extra = match self {
            Self::Name => None,
            Self::Email => Some(&record.email),
            Self::Phone => Some(&record.phone),
            Self::NameAddress => Some(&record.address),
            Self::NamePhone => Some(&record.phone),
        };
        if let Some(value) = extra {
            if !sentinels.is_valid(value) {
                return None;
            }
        }

        let mut components = Vec::with_capacity(2);
        if self.uses_name() {
            let name = record.name_key();
            if !sentinels.is_valid(&name) {
                return None;
            }
            components.push(names.resolve(&name));
        }
        if let Some(value) = extra {
            components.push(value.clone());
        }
        Some(MatchKey::new(components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(first: &str, last: &str, email: &str, phone: &str) -> NormalizedRecord {
        NormalizedRecord {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    #[test]
    fn key_with_sentinel_component_is_invalid() {
        let s = Sentinels::default();
        assert!(MatchKey::new(vec!["jon smith".into(), "5551234".into()]).is_valid(&s));
        assert!(!MatchKey::new(vec!["jon smith".into(), "no call".into()]).is_valid(&s));
        assert!(!MatchKey::new(Vec::new()).is_valid(&s));
    }

    #[test]
    fn encode_joins_with_separator() {
        let key = MatchKey::new(vec!["jon smith".into(), "5551234".into()]);
        assert_eq!(key.encode("\u{b7}"), "jon smith\u{b7}5551234");
    }

    #[test]
    fn name_phone_key_folds_name() {
        let sentinels = Sentinels::default();
        let mut names = FuzzyKeyIndex::new(3);
        let a = KeyKind::NamePhone
            .build(&rec("jon", "smith", "", "5551234"), &sentinels, &mut names)
            .unwrap();
        let b = KeyKind::NamePhone
            .build(&rec("john", "smith", "", "5551234"), &sentinels, &mut names)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.components(), &["jon smith".to_string(), "5551234".to_string()]);
    }

    #[test]
    fn sentinel_component_yields_no_key() {
        let sentinels = Sentinels::default();
        let mut names = FuzzyKeyIndex::new(3);
        assert!(KeyKind::Email
            .build(&rec("jon", "smith", "n/a", ""), &sentinels, &mut names)
            .is_none());
        assert!(KeyKind::Phone
            .build(&rec("jon", "smith", "", "nocall"), &sentinels, &mut names)
            .is_none());
        assert!(KeyKind::Name.build(&rec("", "", "", ""), &sentinels, &mut names).is_none());
    }

    #[test]
    fn invalid_key_does_not_register_name() {
        let sentinels = Sentinels::default();
        let mut names = FuzzyKeyIndex::new(3);
        KeyKind::NamePhone.build(&rec("jon", "smith", "", "none"), &sentinels, &mut names);
        assert!(names.is_empty());
    }

    #[test]
    fn key_fields_by_kind() {
        assert_eq!(KeyKind::Email.fields(), &[Field::Email]);
        assert!(KeyKind::NameAddress.fields().contains(&Field::Address));
        assert!(!KeyKind::Email.uses_name());
    }
}
