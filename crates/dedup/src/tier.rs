//! Tier classification: which identifying fields a record is deduplicated on.
//!
//! The precedence order is a contract. A record with name, email and address is
//! `NameEmail`, never `NameAddress`; reordering changes which field combination
//! is trusted as the key.

use std::fmt;

use serde::Serialize;

use crate::key::KeyKind;
use crate::normalize::{NormalizedRecord, Sentinels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Full name + email.
    NameEmail,
    /// Email without a full name.
    EmailOnly,
    /// Full name + address, no email.
    NameAddress,
    /// Full name + phone, no email or address.
    NamePhone,
    /// Full name and nothing else usable.
    NameOnly,
    /// Passed through untouched.
    Other,
}

/// Which identifying fields carry a usable (non-sentinel) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presence {
    pub full_name: bool,
    pub email: bool,
    pub address: bool,
    pub phone: bool,
}

impl Presence {
    pub fn of(record: &NormalizedRecord, sentinels: &Sentinels) -> Self {
        Self {
            full_name: sentinels.is_valid(&record.first_name)
                && sentinels.is_valid(&record.last_name),
            email: sentinels.is_valid(&record.email),
            address: sentinels.is_valid(&record.address),
            phone: sentinels.is_valid(&record.phone),
        }
    }
}

impl Tier {
    /// Precedence order.
    pub const ALL: [Tier; 6] = [
        Tier::NameEmail,
        Tier::EmailOnly,
        Tier::NameAddress,
        Tier::NamePhone,
        Tier::NameOnly,
        Tier::Other,
    ];

    /// First matching tier in precedence order.
    pub fn from_presence(p: Presence) -> Tier {
        match p {
            Presence { full_name: true, email: true, .. } => Tier::NameEmail,
            Presence { email: true, .. } => Tier::EmailOnly,
            Presence { full_name: true, address: true, .. } => Tier::NameAddress,
            Presence { full_name: true, phone: true, .. } => Tier::NamePhone,
            Presence { full_name: true, .. } => Tier::NameOnly,
            _ => Tier::Other,
        }
    }

    pub fn classify(record: &NormalizedRecord, sentinels: &Sentinels) -> Tier {
        Self::from_presence(Presence::of(record, sentinels))
    }

    /// 1-based precedence rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::NameEmail => 1,
            Self::EmailOnly => 2,
            Self::NameAddress => 3,
            Self::NamePhone => 4,
            Self::NameOnly => 5,
            Self::Other => 6,
        }
    }

    /// Key the tier clusters on; `Other` never clusters.
    pub fn key_kind(&self) -> Option<KeyKind> {
        match self {
            Self::NameEmail | Self::EmailOnly => Some(KeyKind::Email),
            Self::NameAddress => Some(KeyKind::NameAddress),
            Self::NamePhone => Some(KeyKind::NamePhone),
            Self::NameOnly => Some(KeyKind::Name),
            Self::Other => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NameEmail => "name_email",
            Self::EmailOnly => "email_only",
            Self::NameAddress => "name_address",
            Self::NamePhone => "name_phone",
            Self::NameOnly => "name_only",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(first: &str, last: &str, address: &str, email: &str, phone: &str) -> NormalizedRecord {
        NormalizedRecord {
            first_name: first.into(),
            last_name: last.into(),
            address: address.into(),
            email: email.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    fn classify(r: &NormalizedRecord) -> Tier {
        Tier::classify(r, &Sentinels::default())
    }

    #[test]
    fn name_and_email_beats_address() {
        let r = rec("jon", "smith", "1 main st", "jon@example.com", "5551234");
        assert_eq!(classify(&r), Tier::NameEmail);
    }

    #[test]
    fn email_without_full_name() {
        assert_eq!(classify(&rec("jon", "", "", "jon@example.com", "")), Tier::EmailOnly);
        assert_eq!(classify(&rec("", "", "1 main st", "jon@example.com", "")), Tier::EmailOnly);
    }

    #[test]
    fn address_beats_phone() {
        let r = rec("jon", "smith", "1 main st", "", "5551234");
        assert_eq!(classify(&r), Tier::NameAddress);
    }

    #[test]
    fn phone_when_no_address() {
        assert_eq!(classify(&rec("jon", "smith", "", "none", "5551234")), Tier::NamePhone);
    }

    #[test]
    fn name_only() {
        assert_eq!(classify(&rec("jon", "smith", "", "n/a", "no call")), Tier::NameOnly);
    }

    #[test]
    fn partial_name_without_email_is_other() {
        assert_eq!(classify(&rec("jon", "", "1 main st", "", "5551234")), Tier::Other);
        assert_eq!(classify(&NormalizedRecord::default()), Tier::Other);
    }

    #[test]
    fn ranks_follow_precedence() {
        let ranks: Vec<u8> = Tier::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
        assert!(Tier::NameEmail < Tier::Other);
        assert_eq!(Tier::Other.key_kind(), None);
    }

    fn arb_field() -> impl Strategy<Value = String> {
        prop_oneof![
            2 => r"[a-z]{1,8}",
            1 => Just(String::new()),
            1 => prop::sample::select(vec!["none", "n/a", "x", "nocall"]).prop_map(String::from),
        ]
    }

    proptest! {
        #[test]
        fn exactly_one_tier_by_first_predicate(
            first in arb_field(),
            last in arb_field(),
            address in arb_field(),
            email in arb_field(),
            phone in arb_field(),
        ) {
            let r = rec(&first, &last, &address, &email, &phone);
            let s = Sentinels::default();
            let p = Presence::of(&r, &s);
            let predicates = [
                p.full_name && p.email,
                p.email,
                p.full_name && p.address,
                p.full_name && p.phone,
                p.full_name,
                true,
            ];
            let first_hit = predicates.iter().position(|&hit| hit).unwrap();
            prop_assert_eq!(Tier::classify(&r, &s), Tier::ALL[first_hit]);
        }
    }
}
