//! Extracts the route from a KML export: single-coordinate placemarks become points of interest,
//! longer ones become segments of the path.

#[macro_use]
extern crate log;

mod coords;
mod tables;

use anyhow::{bail, Context, Result};

use maputil::{prettyprint_usize, Timer};

pub use crate::coords::{format_coordinates, parse_coordinates, parse_kml_tuple};
pub use crate::tables::{RouteTables, POINTS_CSV, SEGMENTS_CSV};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// One position along a placemark. Elevation is only present if the KML had a third component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
    pub elevation: Option<f64>,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Coordinate {
        Coordinate {
            lon,
            lat,
            elevation: None,
        }
    }

    pub fn with_elevation(lon: f64, lat: f64, elevation: f64) -> Coordinate {
        Coordinate {
            lon,
            lat,
            elevation: Some(elevation),
        }
    }

    pub fn to_lonlat(self) -> geom::LonLat {
        geom::LonLat::new(self.lon, self.lat)
    }
}

impl From<Coordinate> for geo::Coord {
    fn from(c: Coordinate) -> Self {
        geo::Coord { x: c.lon, y: c.lat }
    }
}

/// A named object from the KML file. The order of `coordinates` is the direction of travel.
#[derive(Clone, Debug, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub coordinates: Vec<Coordinate>,
}

impl Placemark {
    pub fn is_point(&self) -> bool {
        self.coordinates.len() == 1
    }

    pub fn is_segment(&self) -> bool {
        self.coordinates.len() > 1
    }
}

/// Finds every `Placemark` in the document, at any depth. Placemarks without a `name` are called
/// "Unnamed". Fails if a placemark has no `coordinates` element or a coordinate can't be parsed.
pub fn parse_placemarks(raw: &str) -> Result<Vec<Placemark>> {
    let tree = roxmltree::Document::parse(raw)?;

    let mut placemarks = Vec::new();
    for node in tree
        .descendants()
        .filter(|n| n.has_tag_name((KML_NAMESPACE, "Placemark")))
    {
        let name = node
            .children()
            .find(|n| n.has_tag_name((KML_NAMESPACE, "name")))
            .and_then(|n| n.text())
            .map(|x| x.trim().to_string())
            .unwrap_or_else(|| "Unnamed".to_string());

        let coordinates = match node
            .descendants()
            .find(|n| n.has_tag_name((KML_NAMESPACE, "coordinates")))
        {
            Some(n) => n,
            None => bail!("Placemark {} has no coordinates", name),
        };

        let mut pts = Vec::new();
        for token in coordinates.text().unwrap_or("").split_whitespace() {
            pts.push(
                parse_kml_tuple(token)
                    .with_context(|| format!("in placemark {}", name))?,
            );
        }
        placemarks.push(Placemark {
            name,
            coordinates: pts,
        });
    }
    Ok(placemarks)
}

/// Reads a KML file and splits it into points and segments. Only segments within `segment_slice`
/// (by index among all segments) are kept.
pub fn extract(
    path: &str,
    segment_slice: Option<std::ops::Range<usize>>,
    timer: &mut Timer,
) -> Result<RouteTables> {
    timer.start(format!("read {}", path));
    let bytes = mapio::slurp_file(path)?;
    let raw_string = std::str::from_utf8(&bytes)?;
    let placemarks = parse_placemarks(raw_string).with_context(|| format!("parsing {}", path))?;
    timer.stop(format!("read {}", path));

    let num_placemarks = placemarks.len();
    let tables = RouteTables::split(placemarks, segment_slice);
    timer.note(format!(
        "Got {} points and {} segments from {} placemarks in {}",
        prettyprint_usize(tables.points.len()),
        prettyprint_usize(tables.segments.len()),
        prettyprint_usize(num_placemarks),
        path
    ));
    Ok(tables)
}
