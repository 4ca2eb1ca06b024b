//! Great-circle distance, used for pickup/destination proximity.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in km between two coordinates, rounded to 2
/// decimal places.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_KM * c * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_km(-0.18, -78.48, -0.18, -78.48), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // Quito to Guayaquil is roughly 270 km as the crow flies.
        let d = haversine_km(-0.1807, -78.4678, -2.1709, -79.9224);
        assert!((250.0..290.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = haversine_km(-0.18, -78.48, -0.20, -78.50);
        let b = haversine_km(-0.20, -78.50, -0.18, -78.48);
        assert_eq!(a, b);
    }
}
