// src/geocoding/candidates.rs
use crate::matching::address::clean_street;
use crate::models::LocationRecord;
use crate::utils::constants::MIN_GEOCODE_QUERY_LEN;

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Joins the parts of one query template, or `None` if any part is missing.
fn compose(parts: &[Option<&str>]) -> Option<String> {
    parts
        .iter()
        .map(|part| present(*part))
        .collect::<Option<Vec<&str>>>()
        .map(|found| found.join(", "))
}

/// Address query strings to try for a record, most specific first.
///
/// Duplicates are dropped keeping the first occurrence, and anything of
/// `MIN_GEOCODE_QUERY_LEN` characters or fewer is discarded.
pub fn generate_candidates(record: &LocationRecord) -> Vec<String> {
    let state = present(record.state_code.as_deref()).or(present(record.state.as_deref()));
    let city = record.city.as_deref();
    let street = record.street.as_deref().map(clean_street);

    let full_address = present(record.address.as_deref())
        .filter(|a| a.contains(','))
        .map(str::to_string);

    let raw = [
        full_address,
        compose(&[street.as_deref(), city, state]),
        compose(&[record.title.as_deref(), city, state]),
        compose(&[street.as_deref(), record.zip.as_deref()]),
        compose(&[city, state]),
    ];

    let mut out: Vec<String> = Vec::new();
    for candidate in raw.into_iter().flatten() {
        if candidate.chars().count() <= MIN_GEOCODE_QUERY_LEN {
            continue;
        }
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}
