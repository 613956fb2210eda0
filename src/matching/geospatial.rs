// src/matching/geospatial.rs
use crate::models::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let (delta_phi, delta_lambda) = ((lat2 - lat1).to_radians(), (lng2 - lng1).to_radians());
    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng)
}

/// Proximity gate. Records without coordinates never pass.
pub fn within_km(a: Option<&Coordinates>, b: Option<&Coordinates>, max_km: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => distance_km(a, b) <= max_km,
        _ => false,
    }
}

/// Coordinates that are almost certainly wrong for a US/CA listing: null
/// island, or outside the North American envelope (typically a dropped minus
/// sign or swapped lat/lng).
pub fn is_suspicious_coordinate(coords: &Coordinates) -> bool {
    if coords.lat.abs() < 1e-6 && coords.lng.abs() < 1e-6 {
        return true;
    }
    !(15.0..=72.0).contains(&coords.lat) || !(-180.0..=-50.0).contains(&coords.lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // Chicago to St. Louis, roughly 422 km
        let d = haversine_km(41.8781, -87.6298, 38.6270, -90.1994);
        assert!((d - 422.1).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_haversine_zero_and_symmetric() {
        assert_eq!(haversine_km(35.0, -90.0, 35.0, -90.0), 0.0);
        let ab = haversine_km(35.1234, -90.5678, 35.1235, -90.5677);
        let ba = haversine_km(35.1235, -90.5677, 35.1234, -90.5678);
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab < 0.02);
    }

    #[test]
    fn test_within_km_requires_both_coordinates() {
        let a = Coordinates::new(35.0, -90.0);
        let b = Coordinates::new(35.0005, -90.0);
        assert!(within_km(a.as_ref(), b.as_ref(), 0.1));
        assert!(!within_km(a.as_ref(), None, 1000.0));
        assert!(!within_km(None, None, 1000.0));
    }

    #[test]
    fn test_suspicious_coordinates() {
        assert!(is_suspicious_coordinate(&Coordinates { lat: 0.0, lng: 0.0 }));
        assert!(is_suspicious_coordinate(&Coordinates { lat: 41.8, lng: 87.6 }));
        assert!(is_suspicious_coordinate(&Coordinates { lat: -87.6, lng: 41.8 }));
        assert!(!is_suspicious_coordinate(&Coordinates { lat: 41.8, lng: -87.6 }));
        assert!(!is_suspicious_coordinate(&Coordinates { lat: 21.3, lng: -157.8 }));
    }
}
