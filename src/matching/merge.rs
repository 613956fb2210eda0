// src/matching/merge.rs
//
// Field-precedence rules for combining two matched records. `merge_records` is
// a pure function; duplicate counting happens in the phase runner.

use std::collections::HashSet;

use crate::models::location::dedup_case_insensitive;
use crate::models::{DedupPhase, LocationRecord, Review};

fn longer_non_empty(a: &Option<String>, b: &Option<String>) -> Option<String> {
    match (a.as_deref(), b.as_deref()) {
        (Some(x), Some(y)) if y.chars().count() > x.chars().count() => Some(y.to_string()),
        (Some(x), _) if !x.is_empty() => Some(x.to_string()),
        (_, Some(y)) if !y.is_empty() => Some(y.to_string()),
        _ => None,
    }
}

fn first_present(a: &Option<String>, b: &Option<String>) -> Option<String> {
    a.clone().or_else(|| b.clone())
}

fn union_reviews(a: &[Review], b: &[Review]) -> Vec<Review> {
    let mut seen = HashSet::new();
    a.iter()
        .chain(b.iter())
        .filter(|review| seen.insert(review.dedup_key()))
        .cloned()
        .collect()
}

fn union_provenance(a: &[String], b: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(a.len() + b.len());
    for source in a.iter().chain(b.iter()) {
        if !out.contains(source) {
            out.push(source.clone());
        }
    }
    out
}

fn max_rating(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

/// Combines `a` and `b` into a new canonical record tagged with `reason`.
///
/// Coordinates come from whichever side has the longer textual lat/lng
/// representation (ties keep `a`); this compares character counts, not numeric
/// precision.
pub fn merge_records(a: &LocationRecord, b: &LocationRecord, reason: DedupPhase) -> LocationRecord {
    let take_b_coordinates = match (&a.coordinates, &b.coordinates) {
        (Some(ca), Some(cb)) => cb.textual_len() > ca.textual_len(),
        (None, Some(_)) => true,
        _ => false,
    };
    let (coordinates, geocode) = if take_b_coordinates {
        (b.coordinates, b.geocode.clone().or_else(|| a.geocode.clone()))
    } else {
        (a.coordinates, a.geocode.clone().or_else(|| b.geocode.clone()))
    };

    let reviews = union_reviews(&a.reviews, &b.reviews);
    let review_count = if reviews.is_empty() {
        a.review_count.max(b.review_count)
    } else {
        Some(reviews.len() as u32)
    };

    LocationRecord {
        title: longer_non_empty(&a.title, &b.title),
        address: longer_non_empty(&a.address, &b.address),
        street: first_present(&a.street, &b.street),
        city: first_present(&a.city, &b.city),
        state: first_present(&a.state, &b.state),
        state_code: first_present(&a.state_code, &b.state_code),
        zip: first_present(&a.zip, &b.zip),
        country: first_present(&a.country, &b.country),
        coordinates,
        phone: first_present(&a.phone, &b.phone),
        website: first_present(&a.website, &b.website),
        categories: dedup_case_insensitive(a.categories.iter().chain(b.categories.iter())),
        amenities: dedup_case_insensitive(a.amenities.iter().chain(b.amenities.iter())),
        cost: first_present(&a.cost, &b.cost),
        access: first_present(&a.access, &b.access),
        rating: max_rating(a.rating, b.rating),
        review_count,
        reviews,
        provenance: union_provenance(&a.provenance, &b.provenance),
        merge_reason: Some(reason),
        geocode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn review(name: &str, text: &str) -> Review {
        Review {
            reviewer_name: name.to_string(),
            review_text: text.to_string(),
            ..Default::default()
        }
    }

    fn record(title: &str, source: &str) -> LocationRecord {
        LocationRecord {
            title: Some(title.to_string()),
            provenance: vec![source.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_title_and_address_take_longer_value() {
        let mut a = record("Flying J", "a.json#0");
        a.address = Some("100 Main Street, Springfield, IL".to_string());
        let mut b = record("Flying J Travel Plaza", "b.json#0");
        b.address = Some("100 Main St".to_string());

        let merged = merge_records(&a, &b, DedupPhase::AddressMatch);
        assert_eq!(merged.title.as_deref(), Some("Flying J Travel Plaza"));
        assert_eq!(merged.address.as_deref(), Some("100 Main Street, Springfield, IL"));
        assert_eq!(merged.merge_reason, Some(DedupPhase::AddressMatch));
    }

    #[test]
    fn test_phone_fills_only_when_missing() {
        let mut a = record("Gym", "a");
        let mut b = record("Gym", "b");
        b.phone = Some("217-555-0100".to_string());
        assert_eq!(
            merge_records(&a, &b, DedupPhase::FuzzyTitle).phone.as_deref(),
            Some("217-555-0100")
        );
        a.phone = Some("217-555-0199".to_string());
        assert_eq!(
            merge_records(&a, &b, DedupPhase::FuzzyTitle).phone.as_deref(),
            Some("217-555-0199")
        );
    }

    #[test]
    fn test_coordinates_prefer_longer_text() {
        let mut a = record("Gym", "a");
        a.coordinates = Coordinates::new(-90.5, 35.1);
        let mut b = record("Gym", "b");
        b.coordinates = Coordinates::new(-90.5000001, 35.1);

        let merged = merge_records(&a, &b, DedupPhase::Proximity);
        assert_eq!(merged.coordinates, b.coordinates);

        // ties keep the first record's pair
        let mut c = record("Gym", "c");
        c.coordinates = Coordinates::new(-90.7, 35.2);
        assert_eq!(merge_records(&a, &c, DedupPhase::Proximity).coordinates, a.coordinates);

        // a missing pair is filled from the other side
        let d = record("Gym", "d");
        assert_eq!(merge_records(&d, &a, DedupPhase::Proximity).coordinates, a.coordinates);
    }

    #[test]
    fn test_reviews_union_without_loss() {
        let mut a = record("Gym", "a");
        a.reviews = vec![review("Ann", "Clean showers"), review("Bo", "Busy at night")];
        a.review_count = Some(40);
        let mut b = record("Gym", "b");
        b.reviews = vec![
            review("Ann", "Clean showers"),
            review("Cy", "Friendly staff"),
            review("Cy", "Friendly staff"),
        ];

        let merged = merge_records(&a, &b, DedupPhase::FuzzyTitle);
        assert_eq!(merged.reviews.len(), 3);
        assert!(merged.reviews.len() >= a.reviews.len().max(b.reviews.len()) - 1);
        assert_eq!(merged.review_count, Some(3));
    }

    #[test]
    fn test_review_count_kept_without_review_bodies() {
        let mut a = record("Gym", "a");
        a.review_count = Some(12);
        let mut b = record("Gym", "b");
        b.review_count = Some(30);
        assert_eq!(merge_records(&a, &b, DedupPhase::FuzzyTitle).review_count, Some(30));
    }

    #[test]
    fn test_rating_categories_and_provenance() {
        let mut a = record("Gym", "dallas.json#4");
        a.rating = Some(4.1);
        a.categories = vec!["Gym".to_string(), "Pool".to_string()];
        let mut b = record("Gym", "vendor_b.csv#9");
        b.rating = Some(4.6);
        b.categories = vec!["gym".to_string(), "Sauna".to_string()];
        b.provenance.push("dallas.json#4".to_string());

        let merged = merge_records(&a, &b, DedupPhase::ExactCoordinates);
        assert_eq!(merged.rating, Some(4.6));
        assert_eq!(merged.categories, vec!["Gym", "Pool", "Sauna"]);
        assert_eq!(merged.provenance, vec!["dallas.json#4", "vendor_b.csv#9"]);
    }

    #[test]
    fn test_merge_is_pure() {
        let a = record("Gym", "a");
        let b = record("Gym Plus", "b");
        let first = merge_records(&a, &b, DedupPhase::FuzzyTitle);
        let second = merge_records(&a, &b, DedupPhase::FuzzyTitle);
        assert_eq!(first, second);
        assert_eq!(a.provenance, vec!["a"]);
    }
}
