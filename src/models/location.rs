// src/models/location.rs
//
// Canonical location record and its lenient JSON wire format. Scrape dumps and
// vendor exports disagree on number-vs-string coordinates, comma-joined vs
// array categories and a handful of field names, so everything is read through
// `LocationRecordWire` and normalized into `LocationRecord`.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::stats_models::DedupPhase;

/// Latitude/longitude pair. Only ever constructed from two finite values, so a
/// record can never carry half a coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    /// Character count of the textual lat/lng representation. Used by the merge
    /// engine to prefer the "more precise looking" pair.
    pub fn textual_len(&self) -> usize {
        self.lat.to_string().len() + self.lng.to_string().len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub review_text: String,
    #[serde(default, deserialize_with = "de_opt_f64", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Review {
    /// Composite identity: reviewer name plus the first 50 characters of the text.
    pub fn dedup_key(&self) -> String {
        let prefix: String = self.review_text.chars().take(50).collect();
        format!("{}|{}", self.reviewer_name.trim(), prefix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStatus {
    Success,
    Failed,
    NoAddress,
}

/// Audit trail attached to a record by the geocoding backfill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeAudit {
    pub status: GeocodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub attempted_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationRecord {
    pub title: Option<String>,
    pub address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub state_code: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub categories: Vec<String>,
    pub amenities: Vec<String>,
    pub cost: Option<String>,
    pub access: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub reviews: Vec<Review>,
    pub provenance: Vec<String>,
    pub merge_reason: Option<DedupPhase>,
    pub geocode: Option<GeocodeAudit>,
}

impl LocationRecord {
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn address_str(&self) -> &str {
        self.address.as_deref().unwrap_or("")
    }

    pub fn city_str(&self) -> &str {
        self.city.as_deref().unwrap_or("")
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories
            .first()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Appends a source identifier unless it is already present.
    pub fn add_provenance(&mut self, source: impl Into<String>) {
        let source = source.into();
        if !self.provenance.contains(&source) {
            self.provenance.push(source);
        }
    }
}

/// Dedupes case-insensitively, keeping the casing of the first occurrence.
pub fn dedup_case_insensitive<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// On-disk shape of a record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecordWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(default, alias = "postalCode", skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, alias = "latitude", deserialize_with = "de_opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", alias = "longitude", deserialize_with = "de_opt_f64")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list", skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_string", skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, alias = "reviewsCount", deserialize_with = "de_opt_u32", skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
    #[serde(default, alias = "sources", deserialize_with = "de_string_list")]
    pub provenance: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_reason: Option<DedupPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode: Option<GeocodeAudit>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<LocationRecordWire> for LocationRecord {
    fn from(wire: LocationRecordWire) -> Self {
        let coordinates = match (wire.lat, wire.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => None,
        };
        let mut provenance = Vec::new();
        for source in wire.provenance {
            if !provenance.contains(&source) {
                provenance.push(source);
            }
        }
        Self {
            title: non_blank(wire.title),
            address: non_blank(wire.address),
            street: non_blank(wire.street),
            city: non_blank(wire.city),
            state: non_blank(wire.state),
            state_code: non_blank(wire.state_code),
            zip: non_blank(wire.zip),
            country: non_blank(wire.country),
            coordinates,
            phone: non_blank(wire.phone),
            website: non_blank(wire.website),
            categories: dedup_case_insensitive(wire.categories),
            amenities: dedup_case_insensitive(wire.amenities),
            cost: non_blank(wire.cost),
            access: non_blank(wire.access),
            rating: wire.rating.filter(|r| r.is_finite()),
            review_count: wire.review_count,
            reviews: wire.reviews,
            provenance,
            merge_reason: wire.merge_reason,
            geocode: wire.geocode,
        }
    }
}

impl From<LocationRecord> for LocationRecordWire {
    fn from(record: LocationRecord) -> Self {
        Self {
            title: record.title,
            address: record.address,
            street: record.street,
            city: record.city,
            state: record.state,
            state_code: record.state_code,
            zip: record.zip,
            country: record.country,
            lat: record.coordinates.map(|c| c.lat),
            lng: record.coordinates.map(|c| c.lng),
            phone: record.phone,
            website: record.website,
            categories: record.categories,
            amenities: record.amenities,
            cost: record.cost,
            access: record.access,
            rating: record.rating,
            review_count: record.review_count,
            reviews: record.reviews,
            provenance: record.provenance,
            merge_reason: record.merge_reason,
            geocode: record.geocode,
        }
    }
}

impl Serialize for LocationRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LocationRecordWire::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LocationRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LocationRecordWire::deserialize(deserializer).map(LocationRecord::from)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

pub(crate) fn de_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n).filter(|n| n.is_finite())),
        Some(NumberOrString::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            Ok(trimmed.parse::<f64>().ok().filter(|n| n.is_finite()))
        }
    }
}

fn de_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(de_opt_f64(deserializer)?
        .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n.round() as u32))
}

fn de_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Text(s)) => Ok(Some(s)),
        Some(NumberOrString::Number(n)) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Ok(Some(format!("{}", n as i64)))
            } else {
                Ok(Some(n.to_string()))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    Text(String),
    List(Vec<serde_json::Value>),
}

fn de_string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match Option::<StringOrList>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(StringOrList::Text(s)) => Ok(s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()),
        Some(StringOrList::List(values)) => values
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(Ok(s)),
                serde_json::Value::Number(n) => Some(Ok(n.to_string())),
                other => Some(Err(de::Error::custom(format!(
                    "expected string list entry, found {}",
                    other
                )))),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coordinates_require_both_values() {
        let only_lat: LocationRecord = serde_json::from_value(json!({
            "title": "Half Pair",
            "lat": 35.1
        }))
        .unwrap();
        assert!(only_lat.coordinates.is_none());

        let string_coords: LocationRecord = serde_json::from_value(json!({
            "title": "Strings",
            "lat": "35.1234",
            "lng": "-90.5678"
        }))
        .unwrap();
        assert_eq!(
            string_coords.coordinates,
            Some(Coordinates { lat: 35.1234, lng: -90.5678 })
        );

        let garbage: LocationRecord = serde_json::from_value(json!({
            "lat": "n/a",
            "lng": -90.0
        }))
        .unwrap();
        assert!(garbage.coordinates.is_none());
    }

    #[test]
    fn test_categories_dedup_keeps_first_casing() {
        let record: LocationRecord = serde_json::from_value(json!({
            "categories": "Gym, gym, Truck Stop,  GYM , truck stop"
        }))
        .unwrap();
        assert_eq!(record.categories, vec!["Gym", "Truck Stop"]);

        let from_array: LocationRecord = serde_json::from_value(json!({
            "categories": ["Pool", "pool", "Spa"]
        }))
        .unwrap();
        assert_eq!(from_array.categories, vec!["Pool", "Spa"]);
    }

    #[test]
    fn test_aliases_and_numeric_phone() {
        let record: LocationRecord = serde_json::from_value(json!({
            "title": "Aliased",
            "latitude": 40.0,
            "lon": -75.5,
            "postalCode": "19103",
            "sources": ["vendor_a.csv#3"],
            "phone": 2155551234u64,
            "reviewsCount": "12"
        }))
        .unwrap();
        assert_eq!(record.coordinates, Some(Coordinates { lat: 40.0, lng: -75.5 }));
        assert_eq!(record.zip.as_deref(), Some("19103"));
        assert_eq!(record.provenance, vec!["vendor_a.csv#3"]);
        assert_eq!(record.phone.as_deref(), Some("2155551234"));
        assert_eq!(record.review_count, Some(12));
    }

    #[test]
    fn test_serialization_uses_camel_case_and_flat_coordinates() {
        let record = LocationRecord {
            title: Some("Planet Fitness".to_string()),
            coordinates: Coordinates::new(41.5, -87.25),
            review_count: Some(3),
            merge_reason: Some(DedupPhase::FuzzyTitle),
            provenance: vec!["chicago.json#1".to_string()],
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["lat"], json!(41.5));
        assert_eq!(value["lng"], json!(-87.25));
        assert_eq!(value["reviewCount"], json!(3));
        assert_eq!(value["mergeReason"], json!("fuzzy_title"));
        assert!(value.get("review_count").is_none());

        let back: LocationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_review_key_uses_first_fifty_chars() {
        let long_text = "a".repeat(80);
        let r1 = Review {
            reviewer_name: "Sam".to_string(),
            review_text: long_text.clone(),
            ..Default::default()
        };
        let r2 = Review {
            reviewer_name: "Sam".to_string(),
            review_text: format!("{}{}", &long_text[..50], "different tail"),
            ..Default::default()
        };
        assert_eq!(r1.dedup_key(), r2.dedup_key());
    }

    #[test]
    fn test_textual_len_counts_characters() {
        let c = Coordinates::new(-90.5, 35.1234).unwrap();
        assert_eq!(c.textual_len(), "-90.5".len() + "35.1234".len());
    }
}
