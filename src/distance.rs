//! Great-circle distance between WGS84 points.

use geo::Point;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// Meters, `x` = lon, `y` = lat. NaN in, NaN out.
pub fn haversine_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    let phi1 = a.y().to_radians();
    let phi2 = b.y().to_radians();
    let dphi = (b.y() - a.y()).to_radians();
    let dlambda = (b.x() - a.x()).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Point::new(0.0, 0.0);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let dist = haversine_distance(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((dist - 111_195.0).abs() < 1_111.95, "got {dist}");
    }

    #[test]
    fn symmetric() {
        let a = Point::new(79.1594, 12.9716);
        let b = Point::new(79.1374, 12.9796);
        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn nan_propagates() {
        let dist = haversine_distance(Point::new(f64::NAN, 0.0), Point::new(0.0, 0.0));
        assert!(dist.is_nan());
    }
}
