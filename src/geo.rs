// ABOUTME: Great-circle distance between two coordinate pairs using the haversine formula
// ABOUTME: Backs the proximity search and the radius filter in plant queries

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers on a spherical Earth approximation.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(distance_km(-15.79, -47.88, -15.79, -47.88), 0.0);
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let ab = distance_km(-15.79, -47.88, -22.90, -43.17);
        let ba = distance_km(-22.90, -43.17, -15.79, -47.88);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Brasília to Rio de Janeiro, roughly 930 km
        let d = distance_km(-15.79, -47.88, -22.90, -43.17);
        assert!(d > 900.0 && d < 960.0, "got {d}");
    }

    #[test]
    fn test_short_distance() {
        // ~1 degree of longitude at the equator is ~111 km
        let d = distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }
}
