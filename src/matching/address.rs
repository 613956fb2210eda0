// src/matching/address.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Long street-suffix forms folded to their USPS abbreviation.
const SUFFIX_SYNONYMS: [(&str, &str); 26] = [
    ("street", "st"),
    ("str", "st"),
    ("avenue", "ave"),
    ("av", "ave"),
    ("road", "rd"),
    ("boulevard", "blvd"),
    ("blv", "blvd"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("court", "ct"),
    ("place", "pl"),
    ("square", "sq"),
    ("parkway", "pkwy"),
    ("circle", "cir"),
    ("highway", "hwy"),
    ("terrace", "ter"),
    ("trail", "trl"),
    ("expressway", "expy"),
    ("freeway", "fwy"),
    ("turnpike", "tpke"),
    ("route", "rte"),
    ("plaza", "plz"),
    ("center", "ctr"),
    ("centre", "ctr"),
    ("crossing", "xing"),
    ("mountain", "mtn"),
];

const DIRECTIONALS: [&str; 16] = [
    "north", "south", "east", "west", "n", "s", "e", "w", "ne", "nw", "se", "sw", "northeast",
    "northwest", "southeast", "southwest",
];

/// Tokens introducing a unit designator. `fl`/`floor` are left out on purpose:
/// `fl` is also Florida.
const UNIT_MARKERS: [&str; 11] = [
    "apt",
    "apartment",
    "suite",
    "ste",
    "unit",
    "bldg",
    "building",
    "room",
    "rm",
    "lot",
    "space",
];

static SUFFIX_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SUFFIX_SYNONYMS.iter().copied().collect());
static DIRECTIONAL_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| DIRECTIONALS.iter().copied().collect());
static UNIT_MARKER_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| UNIT_MARKERS.iter().copied().collect());

static QUOTED_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|“[^”]*”|\([^)]*\)"#).expect("static regex must compile")
});

/// Unit value following a marker: anything with a digit, or a single letter.
fn looks_like_unit_value(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit()) || token.chars().count() == 1
}

/// Normalizes a free-form street address for exact-key comparison.
///
/// Lowercases, strips punctuation, folds suffix synonyms to abbreviations,
/// drops directionals and unit/suite designators, and collapses separators.
/// Every transformation only removes tokens or maps them onto fixed points, so
/// the function is idempotent.
pub fn normalize_address(address: &str) -> String {
    let lower = address.to_lowercase();
    let cleaned: String = lower
        .chars()
        .map(|c| if c == ',' || c == ';' || c == '/' { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '#')
        .collect();

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let mut kept: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let raw = tokens[i];
        i += 1;

        if raw.starts_with('#') {
            // "# 12" drops the following value too; "#12" is self-contained.
            if raw == "#" && i < tokens.len() && looks_like_unit_value(tokens[i]) {
                i += 1;
            }
            continue;
        }

        // "apt#" and "n#" must hit the marker / directional checks below.
        let token: String = raw.chars().filter(|c| *c != '#').collect();
        if UNIT_MARKER_SET.contains(token.as_str()) {
            if i < tokens.len() && looks_like_unit_value(tokens[i].trim_start_matches('#')) {
                i += 1;
            }
            continue;
        }
        if DIRECTIONAL_SET.contains(token.as_str()) {
            continue;
        }

        let folded = SUFFIX_MAP.get(token.as_str()).copied().unwrap_or(token.as_str());
        // A folded token can never be a marker or directional, so one pass suffices.
        kept.push(folded.to_string());
    }
    kept.join(" ")
}

/// Removes quoted or parenthesised business descriptions that scrapers leave in
/// the street field, e.g. `123 Main St "inside the Walmart"`.
pub fn clean_street(street: &str) -> String {
    let stripped = QUOTED_SEGMENT.replace_all(street, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}
