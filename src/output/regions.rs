// src/output/regions.rs
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

use crate::models::LocationRecord;

pub const UNKNOWN_REGION: &str = "unknown";

/// US states, DC and Canadian provinces/territories.
const REGIONS: [(&str, &str); 64] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("AB", "Alberta"),
    ("BC", "British Columbia"),
    ("MB", "Manitoba"),
    ("NB", "New Brunswick"),
    ("NL", "Newfoundland and Labrador"),
    ("NS", "Nova Scotia"),
    ("NT", "Northwest Territories"),
    ("NU", "Nunavut"),
    ("ON", "Ontario"),
    ("PE", "Prince Edward Island"),
    ("QC", "Quebec"),
    ("SK", "Saskatchewan"),
    ("YT", "Yukon"),
];

/// Lowercased code or full name → canonical code.
static LOOKUP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(REGIONS.len() * 2);
    for (code, name) in REGIONS.iter() {
        map.insert(code.to_lowercase(), *code);
        map.insert(name.to_lowercase(), *code);
    }
    map.insert("québec".to_string(), "QC");
    map.insert("washington dc".to_string(), "DC");
    map.insert("washington d.c.".to_string(), "DC");
    map
});

fn lookup(value: Option<&str>) -> Option<&'static str> {
    let key = value?.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    LOOKUP.get(&key).copied()
}

/// Region code for a record: `stateCode` first, then `state` (code or full
/// name), otherwise `unknown`.
pub fn resolve_region(record: &LocationRecord) -> &'static str {
    lookup(record.state_code.as_deref())
        .or_else(|| lookup(record.state.as_deref()))
        .unwrap_or(UNKNOWN_REGION)
}

pub fn region_name(code: &str) -> &'static str {
    REGIONS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Partitions records by region, keeping input order inside each region.
pub fn group_by_region(records: Vec<LocationRecord>) -> BTreeMap<String, Vec<LocationRecord>> {
    let mut groups: BTreeMap<String, Vec<LocationRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(resolve_region(&record).to_string())
            .or_default()
            .push(record);
    }
    groups
}
