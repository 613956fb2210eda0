// src/matching/phases.rs
//
// One parameterized "scan, key, gate, merge, replace" loop, instantiated for
// each of the six dedup phases.

use std::collections::HashMap;

use crate::matching::address::normalize_address;
use crate::matching::geospatial::within_km;
use crate::matching::merge::merge_records;
use crate::matching::name::{normalize_business_name, normalize_business_name_advanced};
use crate::matching::phone::normalize_phone_number;
use crate::matching::similarity::similarity;
use crate::models::{DedupPhase, DedupStats, LocationRecord};
use crate::utils::constants::*;

/// Candidate key for a record, or `None` when the record cannot take part in
/// the phase at all.
pub type KeyFn = fn(&LocationRecord) -> Option<String>;
pub type PairFn = fn(&LocationRecord, &LocationRecord) -> bool;
pub type MergeFn = fn(&LocationRecord, &LocationRecord, DedupPhase) -> LocationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Every record is folded into the first earlier same-key record that
    /// passes the gate, so a whole key group collapses into one record.
    Fold,
    /// Pairwise scan: the first sufficiently similar later candidate wins and
    /// each record takes part in at most one merge per pass.
    Greedy,
}

#[derive(Clone, Copy)]
pub struct PhaseSpec {
    pub phase: DedupPhase,
    pub mode: MatchMode,
    pub key_fn: KeyFn,
    pub gate_fn: PairFn,
    pub trigger_fn: PairFn,
    pub merge_fn: MergeFn,
}

impl std::fmt::Debug for PhaseSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseSpec")
            .field("phase", &self.phase)
            .field("mode", &self.mode)
            .finish()
    }
}

impl PhaseSpec {
    fn is_match(&self, a: &LocationRecord, b: &LocationRecord) -> bool {
        (self.gate_fn)(a, b) && (self.trigger_fn)(a, b)
    }
}

/// Runs one pass of a phase over the working set.
///
/// Merged records take the slot of the earlier contributor; the later
/// contributor is removed, so no later phase ever sees either original.
pub fn run_phase(
    records: Vec<LocationRecord>,
    spec: &PhaseSpec,
    mut stats: DedupStats,
) -> (Vec<LocationRecord>, DedupStats) {
    let mut slots: Vec<Option<LocationRecord>> = records.into_iter().map(Some).collect();

    let mut bucket_index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();

    match spec.mode {
        MatchMode::Fold => {
            for j in 0..slots.len() {
                let Some(key) = slots[j].as_ref().and_then(spec.key_fn) else {
                    continue;
                };
                let bucket_id = *bucket_index.entry(key).or_insert_with(|| {
                    buckets.push(Vec::new());
                    buckets.len() - 1
                });

                let target = match slots[j].as_ref() {
                    Some(incoming) => buckets[bucket_id].iter().copied().find(|&i| {
                        slots[i]
                            .as_ref()
                            .map_or(false, |existing| spec.is_match(existing, incoming))
                    }),
                    None => None,
                };

                match target {
                    Some(i) => {
                        if let (Some(existing), Some(incoming)) = (slots[i].take(), slots[j].take()) {
                            slots[i] = Some((spec.merge_fn)(&existing, &incoming, spec.phase));
                            stats = stats.record_merge(spec.phase);
                        }
                    }
                    None => buckets[bucket_id].push(j),
                }
            }
        }
        MatchMode::Greedy => {
            for j in 0..slots.len() {
                if let Some(key) = slots[j].as_ref().and_then(spec.key_fn) {
                    let bucket_id = *bucket_index.entry(key).or_insert_with(|| {
                        buckets.push(Vec::new());
                        buckets.len() - 1
                    });
                    buckets[bucket_id].push(j);
                }
            }

            let mut visited = vec![false; slots.len()];
            for members in &buckets {
                for (pos, &i) in members.iter().enumerate() {
                    if visited[i] {
                        continue;
                    }
                    visited[i] = true;
                    for &j in &members[pos + 1..] {
                        if visited[j] {
                            continue;
                        }
                        let matched = match (slots[i].as_ref(), slots[j].as_ref()) {
                            (Some(a), Some(b)) => spec.is_match(a, b),
                            _ => false,
                        };
                        if matched {
                            if let (Some(a), Some(b)) = (slots[i].take(), slots[j].take()) {
                                slots[i] = Some((spec.merge_fn)(&a, &b, spec.phase));
                                stats = stats.record_merge(spec.phase);
                            }
                            visited[j] = true;
                            break;
                        }
                    }
                }
            }
        }
    }

    (slots.into_iter().flatten().collect(), stats)
}

fn always(_: &LocationRecord, _: &LocationRecord) -> bool {
    true
}

/// Rounded textual form of one ordinate. Values that round to zero from below
/// would print as "-0.0000", so the sign is dropped for them.
fn rounded_ordinate(value: f64) -> String {
    let text = format!("{:.prec$}", value, prec = COORDINATE_KEY_DECIMALS);
    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => magnitude.to_string(),
        _ => text,
    }
}

fn coordinate_key(record: &LocationRecord) -> Option<String> {
    record
        .coordinates
        .map(|c| format!("{}_{}", rounded_ordinate(c.lat), rounded_ordinate(c.lng)))
}

fn address_key(record: &LocationRecord) -> Option<String> {
    let normalized = normalize_address(record.address_str());
    (normalized.chars().count() > MIN_ADDRESS_KEY_LEN).then_some(normalized)
}

fn usable_name(name: &str) -> bool {
    name.chars().count() >= MIN_NAME_KEY_LEN
}

fn fuzzy_title_key(record: &LocationRecord) -> Option<String> {
    (record.coordinates.is_some() && usable_name(&normalize_business_name(record.title_str())))
        .then(String::new)
}

fn within_fuzzy_title_range(a: &LocationRecord, b: &LocationRecord) -> bool {
    within_km(a.coordinates.as_ref(), b.coordinates.as_ref(), FUZZY_TITLE_MAX_DISTANCE_KM)
}

fn titles_fuzzy_match(a: &LocationRecord, b: &LocationRecord) -> bool {
    similarity(
        &normalize_business_name(a.title_str()),
        &normalize_business_name(b.title_str()),
    ) > FUZZY_TITLE_MIN_SIMILARITY
}

fn phone_key(record: &LocationRecord) -> Option<String> {
    record.phone.as_deref().and_then(normalize_phone_number)
}

fn within_phone_range(a: &LocationRecord, b: &LocationRecord) -> bool {
    within_km(a.coordinates.as_ref(), b.coordinates.as_ref(), PHONE_MATCH_MAX_DISTANCE_KM)
}

fn proximity_key(record: &LocationRecord) -> Option<String> {
    record.coordinates.map(|_| String::new())
}

fn within_proximity_cluster(a: &LocationRecord, b: &LocationRecord) -> bool {
    within_km(a.coordinates.as_ref(), b.coordinates.as_ref(), PROXIMITY_MAX_DISTANCE_KM)
}

fn proximity_trigger(a: &LocationRecord, b: &LocationRecord) -> bool {
    let title_a = a.title_str().trim().to_lowercase();
    let title_b = b.title_str().trim().to_lowercase();
    if usable_name(&title_a)
        && usable_name(&title_b)
        && similarity(&title_a, &title_b) > PROXIMITY_MIN_TITLE_SIMILARITY
    {
        return true;
    }
    match (a.primary_category(), b.primary_category()) {
        (Some(ca), Some(cb)) => ca.to_lowercase() == cb.to_lowercase(),
        _ => false,
    }
}

fn chain_name_key(record: &LocationRecord) -> Option<String> {
    let name = normalize_business_name_advanced(record.title_str());
    let city = record.city_str().trim().to_lowercase();
    (usable_name(&name) && !city.is_empty()).then(|| format!("{}_{}", name, city))
}

fn within_chain_range(a: &LocationRecord, b: &LocationRecord) -> bool {
    within_km(a.coordinates.as_ref(), b.coordinates.as_ref(), CHAIN_NAME_MAX_DISTANCE_KM)
}

pub const EXACT_COORDINATES: PhaseSpec = PhaseSpec {
    phase: DedupPhase::ExactCoordinates,
    mode: MatchMode::Fold,
    key_fn: coordinate_key,
    gate_fn: always,
    trigger_fn: always,
    merge_fn: merge_records,
};

pub const ADDRESS_MATCH: PhaseSpec = PhaseSpec {
    phase: DedupPhase::AddressMatch,
    mode: MatchMode::Fold,
    key_fn: address_key,
    gate_fn: always,
    trigger_fn: always,
    merge_fn: merge_records,
};

pub const FUZZY_TITLE: PhaseSpec = PhaseSpec {
    phase: DedupPhase::FuzzyTitle,
    mode: MatchMode::Greedy,
    key_fn: fuzzy_title_key,
    gate_fn: within_fuzzy_title_range,
    trigger_fn: titles_fuzzy_match,
    merge_fn: merge_records,
};

pub const PHONE_MATCH: PhaseSpec = PhaseSpec {
    phase: DedupPhase::PhoneMatch,
    mode: MatchMode::Fold,
    key_fn: phone_key,
    gate_fn: within_phone_range,
    trigger_fn: always,
    merge_fn: merge_records,
};

pub const PROXIMITY: PhaseSpec = PhaseSpec {
    phase: DedupPhase::Proximity,
    mode: MatchMode::Greedy,
    key_fn: proximity_key,
    gate_fn: within_proximity_cluster,
    trigger_fn: proximity_trigger,
    merge_fn: merge_records,
};

pub const NORMALIZED_NAME: PhaseSpec = PhaseSpec {
    phase: DedupPhase::NormalizedName,
    mode: MatchMode::Fold,
    key_fn: chain_name_key,
    gate_fn: within_chain_range,
    trigger_fn: always,
    merge_fn: merge_records,
};

/// The six phases in their load-bearing order.
pub const PHASES: [PhaseSpec; 6] = [
    EXACT_COORDINATES,
    ADDRESS_MATCH,
    FUZZY_TITLE,
    PHONE_MATCH,
    PROXIMITY,
    NORMALIZED_NAME,
];
