use anyhow::{bail, Result};

use geom::GPSBounds;

/// The rectangle of the world the figure shows, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapExtent {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl MapExtent {
    /// Frames the route: the full north-south span of the route, centered east-west, `aspect`
    /// times as wide as it is tall, plus `margin` degrees on every side.
    pub fn around_route(route: &GPSBounds, aspect: f64, margin: f64) -> Result<MapExtent> {
        if route.is_empty() {
            bail!("Can't frame a map around a route with no coordinates");
        }
        let center = route.center();
        let width = route.height() * aspect;
        Ok(MapExtent {
            min_lon: center.x() - width / 2.0 - margin,
            max_lon: center.x() + width / 2.0 + margin,
            min_lat: route.min_lat - margin,
            max_lat: route.max_lat + margin,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn to_bounds(&self) -> GPSBounds {
        GPSBounds {
            min_lon: self.min_lon,
            min_lat: self.min_lat,
            max_lon: self.max_lon,
            max_lat: self.max_lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use geom::LonLat;

    use super::*;

    #[test]
    fn frames_the_route() {
        let route = GPSBounds::from(&[LonLat::new(-4.8, 55.9), LonLat::new(-4.2, 56.9)]);
        let extent = MapExtent::around_route(&route, 1.57, 0.1).unwrap();
        let expected = MapExtent {
            min_lon: -4.5 - 0.785 - 0.1,
            max_lon: -4.5 + 0.785 + 0.1,
            min_lat: 55.8,
            max_lat: 57.0,
        };
        for (a, b) in [
            (extent.min_lon, expected.min_lon),
            (extent.max_lon, expected.max_lon),
            (extent.min_lat, expected.min_lat),
            (extent.max_lat, expected.max_lat),
        ] {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
        // The east-west span of the route itself doesn't matter
        assert!((extent.width() - (1.57 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn empty_route() {
        assert!(MapExtent::around_route(&GPSBounds::new(), 1.57, 0.1).is_err());
    }
}
