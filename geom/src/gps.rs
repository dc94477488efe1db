use std::fmt;

use serde::{Deserialize, Serialize};

/// longitude is x, latitude is y
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    pub fn x(&self) -> f64 {
        self.longitude
    }

    pub fn y(&self) -> f64 {
        self.latitude
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

impl From<LonLat> for geo::Coord {
    fn from(pt: LonLat) -> Self {
        geo::Coord {
            x: pt.longitude,
            y: pt.latitude,
        }
    }
}

impl From<geo::Coord> for LonLat {
    fn from(c: geo::Coord) -> Self {
        LonLat::new(c.x, c.y)
    }
}

impl From<LonLat> for geo::Point {
    fn from(pt: LonLat) -> Self {
        geo::Point::new(pt.longitude, pt.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_conversions() {
        let pt = LonLat::new(-4.5, 56.0);
        let c: geo::Coord = pt.into();
        assert_eq!((c.x, c.y), (-4.5, 56.0));
        assert_eq!(LonLat::from(c), pt);
        assert_eq!(pt.to_string(), "LonLat(-4.5, 56)");
    }
}
