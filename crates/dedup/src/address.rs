//! Address segmentation seam. The pipeline only consumes ZIP codes from it;
//! a failed tag is treated as absent data and never propagated.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressComponents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name_post_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The same label would be assigned to two separate tokens.
    RepeatedLabel(&'static str),
    Unparseable,
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepeatedLabel(label) => write!(f, "repeated label: {label}"),
            Self::Unparseable => write!(f, "address could not be segmented"),
        }
    }
}

impl std::error::Error for TagError {}

pub trait AddressTagger {
    fn tag(&self, address: &str) -> Result<AddressComponents, TagError>;
}

/// ZIP code of `address`, or `""` when tagging fails or finds none.
pub fn extract_zip(tagger: &dyn AddressTagger, address: &str) -> String {
    match tagger.tag(address) {
        Ok(components) => components.zip_code.unwrap_or_default(),
        Err(e) => {
            log::debug!("no zip for '{address}': {e}");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern tagger
// ---------------------------------------------------------------------------

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+[A-Za-z]?)\s+").expect("valid address number pattern"));
static ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5}(?:-\d{4})?)\b").expect("valid zip pattern"));
static STATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)[\s,]*\b([A-Za-z]{2})\s*$").expect("valid state pattern"));

const POST_TYPES: &[&str] = &[
    "st", "street", "ave", "av", "avenue", "rd", "road", "blvd", "boulevard", "dr", "drive", "ln",
    "lane", "ct", "court", "way", "pl", "place", "ter", "terrace", "pkwy", "parkway", "cir",
    "circle", "hwy", "highway", "sq", "square",
];

/// Regex segmentation of US-style addresses:
/// `<number> <street> <post type>, <place>, <state> <zip>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternTagger;

impl PatternTagger {
    pub fn new() -> Self {
        Self
    }
}

impl AddressTagger for PatternTagger {
    fn tag(&self, address: &str) -> Result<AddressComponents, TagError> {
        let mut rest = address.trim().to_string();
        if rest.is_empty() {
            return Err(TagError::Unparseable);
        }

        let mut out = AddressComponents::default();

        let number = NUMBER_RE
            .captures(&rest)
            .map(|caps| (caps[1].to_string(), caps[0].len()));
        if let Some((number, consumed)) = number {
            out.address_number = Some(number);
            rest = rest[consumed..].to_string();
        }

        let zips: Vec<(usize, usize)> = ZIP_RE
            .find_iter(&rest)
            .map(|m| (m.start(), m.end()))
            .collect();
        match zips.as_slice() {
            [] => {}
            [(start, end)] => {
                out.zip_code = Some(rest[*start..*end].to_string());
                rest = format!("{}{}", &rest[..*start], &rest[*end..]);
            }
            _ => return Err(TagError::RepeatedLabel("ZipCode")),
        }

        let parts: Vec<&str> = rest
            .split(',')
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();

        let (street, locality) = match parts.as_slice() {
            [] => (None, Vec::new()),
            [street, locality @ ..] => (Some(*street), locality.to_vec()),
        };

        if let Some(street) = street {
            let words: Vec<&str> = street.split_whitespace().collect();
            let is_post = |w: &str| POST_TYPES.contains(&w.trim_end_matches('.').to_lowercase().as_str());
            match words.split_last() {
                Some((last, name)) if !name.is_empty() && is_post(*last) => {
                    out.street_name = Some(name.join(" "));
                    out.street_name_post_type = Some(last.to_string());
                }
                _ => out.street_name = Some(words.join(" ")),
            }
        }

        match locality.as_slice() {
            [] => {}
            [place_state] => {
                if let Some(caps) = STATE_RE.captures(place_state) {
                    let place = caps[1].trim();
                    if !place.is_empty() {
                        out.place_name = Some(place.to_string());
                    }
                    out.state_name = Some(caps[2].to_string());
                } else {
                    out.place_name = Some(place_state.to_string());
                }
            }
            [place, state] => {
                out.place_name = Some(place.to_string());
                out.state_name = Some(state.to_string());
            }
            _ => return Err(TagError::RepeatedLabel("PlaceName")),
        }

        if out == AddressComponents::default() {
            return Err(TagError::Unparseable);
        }
        Ok(out)
    }
}
