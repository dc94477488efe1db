use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};

/// The WGS84 semi-major axis, which spherical web mercator treats as the sphere's radius.
const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Web mercator is undefined at the poles; clamp like every tile server does.
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_6;

/// The only two coordinate reference systems the pipeline understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326. x is longitude, y is latitude, both in degrees.
    Wgs84,
    /// EPSG:3857, spherical (pseudo) mercator. x and y are in meters.
    WebMercator,
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }

    /// Do coordinates in this frame measure meters? Areas and buffer distances only make sense in
    /// a metric frame.
    pub fn is_metric(self) -> bool {
        match self {
            Crs::Wgs84 => false,
            Crs::WebMercator => true,
        }
    }

    /// Transform one coordinate from this frame into WGS84.
    pub fn to_wgs84(self, c: Coord) -> Coord {
        match self {
            Crs::Wgs84 => c,
            Crs::WebMercator => Coord {
                x: (c.x / WEB_MERCATOR_RADIUS_M).to_degrees(),
                y: (2.0 * (c.y / WEB_MERCATOR_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees(),
            },
        }
    }

    /// Transform one WGS84 coordinate into this frame.
    pub fn from_wgs84(self, c: Coord) -> Coord {
        match self {
            Crs::Wgs84 => c,
            Crs::WebMercator => {
                let lat = c
                    .y
                    .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
                    .to_radians();
                Coord {
                    x: WEB_MERCATOR_RADIUS_M * c.x.to_radians(),
                    y: WEB_MERCATOR_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
                }
            }
        }
    }

    /// Transform a coordinate between any two supported frames, pivoting through WGS84.
    pub fn transform_coord(from: Crs, to: Crs, c: Coord) -> Coord {
        if from == to {
            return c;
        }
        to.from_wgs84(from.to_wgs84(c))
    }

    /// Reproject any geo geometry between frames.
    pub fn reproject<G>(geom: &G, from: Crs, to: Crs) -> G
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        if from == to {
            return geom.clone();
        }
        geom.map_coords(|c| Crs::transform_coord(from, to, c))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn mercator_known_values() {
        let origin = Crs::WebMercator.from_wgs84(Coord { x: 0.0, y: 0.0 });
        assert!(close(origin.x, 0.0, 1e-9));
        assert!(close(origin.y, 0.0, 1e-9));

        let edge = Crs::WebMercator.from_wgs84(Coord { x: 180.0, y: 0.0 });
        assert!(close(edge.x, 20_037_508.342_789_244, 1e-6));
    }

    #[test]
    fn mercator_round_trip() {
        for (lon, lat) in [(-4.7, 56.3), (-5.11, 56.82), (0.0, -33.9), (151.2, -33.86)] {
            let pt = Coord { x: lon, y: lat };
            let back = Crs::transform_coord(
                Crs::WebMercator,
                Crs::Wgs84,
                Crs::transform_coord(Crs::Wgs84, Crs::WebMercator, pt),
            );
            assert!(close(back.x, lon, 1e-9));
            assert!(close(back.y, lat, 1e-9));
        }
    }

    #[test]
    fn reproject_geometry() {
        let line = geo::LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]);
        let projected = Crs::reproject(&line, Crs::Wgs84, Crs::WebMercator);
        assert!(projected.0[1].x > 100_000.0);
        let back = Crs::reproject(&projected, Crs::WebMercator, Crs::Wgs84);
        assert!(close(back.0[1].y, 1.0, 1e-9));
    }

    #[test]
    fn names() {
        assert_eq!(Crs::Wgs84.to_string(), "EPSG:4326");
        assert_eq!(Crs::WebMercator.to_string(), "EPSG:3857");
    }
}
