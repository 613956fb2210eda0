// src/matching/name.rs
use once_cell::sync::Lazy;
use std::collections::HashSet;

const FILLER_WORDS: [&str; 3] = ["the", "and", "a"];

const LEGAL_SUFFIXES: [&str; 14] = [
    "llc",
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "limited",
    "lp",
    "llp",
    "pllc",
    "plc",
    "pc",
];

/// Chain names and their rebrands / sub-brands, folded to one canonical name.
/// Patterns are already in basic-normalized form.
const CHAIN_SYNONYMS: [(&str, &str); 22] = [
    ("loves travel stop", "loves"),
    ("loves travel stops", "loves"),
    ("loves travel stops country stores", "loves"),
    ("loves country store", "loves"),
    ("loves country stores", "loves"),
    ("flying j travel plaza", "flying j"),
    ("flying j travel center", "flying j"),
    ("pilot flying j travel center", "pilot flying j"),
    ("pilot travel center", "pilot"),
    ("pilot travel centers", "pilot"),
    ("ta travel center", "ta"),
    ("travelcenters of america", "ta"),
    ("travel centers of america", "ta"),
    ("ta express", "ta"),
    ("petro stopping center", "petro"),
    ("petro stopping centers", "petro"),
    ("petro travel plaza", "petro"),
    ("24 hour fitness sport", "24 hour fitness"),
    ("24 hour fitness super sport", "24 hour fitness"),
    ("planet fitness pf", "planet fitness"),
    ("ymca of", "ymca"),
    ("young mens christian association", "ymca"),
];

static FILLER_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| FILLER_WORDS.iter().copied().collect());
static LEGAL_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| LEGAL_SUFFIXES.iter().copied().collect());

/// Synonym table ordered longest pattern first so the most specific rebrand wins.
static CHAIN_TABLE: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut table = CHAIN_SYNONYMS.to_vec();
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
    table
});

/// Basic business-name normalization: lowercase, punctuation stripped, legal
/// suffixes and filler words removed. Empty input gives an empty string.
pub fn normalize_business_name(name: &str) -> String {
    let mut normalized = name.to_lowercase();
    let char_substitutions = [
        ("&", " "),
        ("+", " "),
        ("/", " "),
        ("-", " "),
        (".", " "),
        (",", " "),
        ("(", " "),
        (")", " "),
        ("'", ""),
        ("’", ""),
    ];
    for (pattern, replacement) in &char_substitutions {
        normalized = normalized.replace(pattern, replacement);
    }
    normalized = normalized
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    normalized
        .split_whitespace()
        .filter(|token| !FILLER_SET.contains(token) && !LEGAL_SET.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Advanced variant used for chain keys: basic normalization, then chain
/// synonyms (longest match first), then store numbers after the first token
/// are dropped ("loves travel stop 123" and "loves 456" both become "loves").
pub fn normalize_business_name_advanced(name: &str) -> String {
    let basic = normalize_business_name(name);
    if basic.is_empty() {
        return basic;
    }

    let mut padded = format!(" {} ", basic);
    for (pattern, canonical) in CHAIN_TABLE.iter() {
        let needle = format!(" {} ", pattern);
        if padded.contains(&needle) {
            padded = padded.replacen(&needle, &format!(" {} ", canonical), 1);
            break;
        }
    }

    padded
        .split_whitespace()
        .enumerate()
        .filter(|(idx, token)| *idx == 0 || !token.chars().all(|c| c.is_ascii_digit()))
        .map(|(_, token)| token)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_normalization() {
        assert_eq!(normalize_business_name("Love's Travel Stop #123"), "loves travel stop 123");
        assert_eq!(normalize_business_name("Loves Travel Stop 123"), "loves travel stop 123");
        assert_eq!(normalize_business_name("The Gym & Spa, LLC"), "gym spa");
        assert_eq!(normalize_business_name("Acme Fitness Co."), "acme fitness");
        assert_eq!(normalize_business_name("Pilot Travel Centers, Inc"), "pilot travel centers");
    }

    #[test]
    fn test_empty_and_blank_names() {
        assert_eq!(normalize_business_name(""), "");
        assert_eq!(normalize_business_name("   "), "");
        assert_eq!(normalize_business_name("The & And"), "");
        assert_eq!(normalize_business_name_advanced(""), "");
    }

    #[test]
    fn test_chain_synonyms() {
        assert_eq!(normalize_business_name_advanced("Love's Travel Stop #123"), "loves");
        assert_eq!(normalize_business_name_advanced("Loves Country Store 456"), "loves");
        assert_eq!(normalize_business_name_advanced("Flying J Travel Plaza"), "flying j");
        assert_eq!(normalize_business_name_advanced("Flying J"), "flying j");
        assert_eq!(
            normalize_business_name_advanced("Pilot Flying J Travel Center #88"),
            "pilot flying j"
        );
        assert_eq!(
            normalize_business_name_advanced("TravelCenters of America"),
            "ta"
        );
    }

    #[test]
    fn test_longest_match_wins() {
        // "loves travel stops country stores" must beat "loves travel stops"
        assert_eq!(
            normalize_business_name_advanced("Love's Travel Stops & Country Stores"),
            "loves"
        );
    }

    #[test]
    fn test_leading_number_kept() {
        assert_eq!(normalize_business_name_advanced("24 Hour Fitness Sport"), "24 hour fitness");
        assert_eq!(normalize_business_name_advanced("24 Hour Fitness 301"), "24 hour fitness");
    }

    #[test]
    fn test_non_chain_names_pass_through() {
        assert_eq!(normalize_business_name_advanced("Joe's Truck Wash"), "joes truck wash");
    }
}
