//! Great-circle distance on a spherical Earth model.

/// Mean Earth radius in kilometers (IUGG).
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance in kilometers between two (lat, lon) points given in
/// decimal degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    // One degree of latitude on the sphere: R * pi / 180
    const ONE_DEGREE_KM: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

    #[test]
    fn zero_distance_for_same_point() {
        assert_eq!(distance_km(55.7558, 37.6176, 55.7558, 37.6176), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - ONE_DEGREE_KM).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - ONE_DEGREE_KM).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn symmetric() {
        let ab = distance_km(55.7558, 37.6176, 59.9343, 30.3351);
        let ba = distance_km(59.9343, 30.3351, 55.7558, 37.6176);
        assert!((ab - ba).abs() < 1e-9);
        // Moscow to St. Petersburg is roughly 630 km
        assert!(ab > 600.0 && ab < 670.0, "got {}", ab);
    }
}
