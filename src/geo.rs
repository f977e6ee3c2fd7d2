//! Great-circle distance on a spherical earth.
//!
//! Used by the attendance service to decide whether a reported position
//! falls inside the office geofence.

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two (latitude, longitude) pairs
/// given in decimal degrees.
///
/// Pure and deterministic. Identical points yield 0. Out-of-range
/// coordinates are the caller's responsibility.
#[must_use]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(
            haversine_distance_m(-6.97321, 107.63014, -6.97321, 107.63014),
            0.0
        );
        assert_eq!(haversine_distance_m(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let d1 = haversine_distance_m(-6.97321, 107.63014, -6.914744, 107.609810);
        let d2 = haversine_distance_m(-6.914744, 107.609810, -6.97321, 107.63014);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree of latitude is roughly 111.2 km on a spherical earth.
        let d = haversine_distance_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_small_offset_near_office() {
        // ~0.00045 degrees of latitude is ~50m.
        let d = haversine_distance_m(-6.97321, 107.63014, -6.97276, 107.63014);
        assert!(d > 45.0 && d < 55.0, "got {d}");
    }
}
