const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Search origin and radius for a "near me" product filter.
#[derive(Debug, Clone, Copy)]
pub struct Radius {
    pub lat: f64,
    pub lng: f64,
    pub km: f64,
}

impl Radius {
    /// Items without coordinates never match a distance filter.
    pub fn contains(&self, lat: Option<f64>, lng: Option<f64>) -> bool {
        match (lat, lng) {
            (Some(lat), Some(lng)) => haversine_km(self.lat, self.lng, lat, lng) <= self.km,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        assert!(haversine_km(52.52, 13.405, 52.52, 13.405).abs() < 1e-9);
    }

    #[test]
    fn berlin_to_paris_is_about_878_km() {
        let d = haversine_km(52.5200, 13.4050, 48.8566, 2.3522);
        assert!((d - 878.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn radius_excludes_missing_coordinates() {
        let near = Radius {
            lat: 12.9716,
            lng: 77.5946,
            km: 10.0,
        };
        assert!(near.contains(Some(12.9352), Some(77.6245)));
        assert!(!near.contains(Some(13.0827), Some(80.2707)));
        assert!(!near.contains(None, Some(77.6)));
    }
}
