//! Fetching polygon layers from the Overpass API and turning its JSON into features.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use geo::{Contains, Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::Deserialize;

use geom::{Crs, LonLat};
use maputil::{prettyprint_usize, Tags, Timer};

use crate::{Feature, FeatureCollection};

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Everything with any of these tag values, within `radius_m` of some center.
#[derive(Clone, Debug, PartialEq)]
pub struct OsmQuery {
    pub tags: &'static [(&'static str, &'static [&'static str])],
    pub radius_m: f64,
}

const NATURE_TAGS: &[(&str, &[&str])] = &[
    (
        "natural",
        &["wood", "grassland", "heath", "scrub", "wetland", "tundra"],
    ),
    (
        "landuse",
        &["forest", "meadow", "farmland", "grass", "orchard"],
    ),
    ("landcover", &["grass", "crop"]),
    ("leisure", &["nature_reserve", "park"]),
];

const WATER_TAGS: &[(&str, &[&str])] = &[
    ("natural", &["water"]),
    ("water", &["lake", "reservoir", "river", "stream"]),
];

impl OsmQuery {
    /// Woods, fields, moors and parks.
    pub fn nature() -> OsmQuery {
        OsmQuery {
            tags: NATURE_TAGS,
            radius_m: 70_000.0,
        }
    }

    /// Lochs, reservoirs and rivers.
    pub fn water() -> OsmQuery {
        OsmQuery {
            tags: WATER_TAGS,
            radius_m: 70_000.0,
        }
    }

    /// See https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL
    pub fn to_overpass_ql(&self, center: LonLat) -> String {
        let mut query = String::from("[out:json][timeout:600];\n(\n");
        for (key, values) in self.tags {
            query.push_str(&format!(
                "  nwr[\"{}\"~\"^({})$\"](around:{},{},{});\n",
                key,
                values.join("|"),
                self.radius_m,
                center.y(),
                center.x()
            ));
        }
        query.push_str(");\nout geom;\n");
        query
    }

    /// Runs the query. No retries; any failure is returned.
    pub async fn fetch(&self, center: LonLat, timer: &mut Timer) -> Result<FeatureCollection> {
        timer.start("query Overpass");
        let bytes = mapio::download_bytes(OVERPASS_URL, Some(self.to_overpass_ql(center))).await?;
        timer.stop("query Overpass");
        parse_overpass(&bytes)
    }
}

#[derive(Deserialize)]
struct Response {
    elements: Vec<Element>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        geometry: Vec<Option<LatLon>>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
}

#[derive(Deserialize)]
struct Member {
    #[serde(rename = "type")]
    member_type: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

#[derive(Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

fn to_coords(geometry: &[Option<LatLon>]) -> Vec<Coord> {
    // Overpass leaves holes for nodes it couldn't place
    geometry
        .iter()
        .flatten()
        .map(|pt| Coord {
            x: pt.lon,
            y: pt.lat,
        })
        .collect()
}

fn is_closed(pts: &[Coord]) -> bool {
    pts.len() >= 4 && pts[0] == pts[pts.len() - 1]
}

/// Parses an Overpass `[out:json]` response produced with `out geom`. Nodes become points, closed
/// ways polygons, open ways line strings, and multipolygon relations are glued together from their
/// members. Other relations are skipped.
pub fn parse_overpass(bytes: &[u8]) -> Result<FeatureCollection> {
    let response: Response =
        serde_json::from_slice(bytes).context("parsing the Overpass response")?;

    let mut collection = FeatureCollection::new(Crs::Wgs84);
    let mut skipped = 0;
    for element in response.elements {
        match element {
            Element::Node { lat, lon, tags } => {
                collection.features.push(Feature::new(
                    Geometry::Point(Point::new(lon, lat)),
                    Tags::new(tags),
                ));
            }
            Element::Way { id, geometry, tags } => {
                let pts = to_coords(&geometry);
                let geometry = if is_closed(&pts) {
                    Geometry::Polygon(Polygon::new(LineString::new(pts), Vec::new()))
                } else if pts.len() >= 2 {
                    Geometry::LineString(LineString::new(pts))
                } else {
                    debug!("Way {} has no usable geometry", id);
                    skipped += 1;
                    continue;
                };
                collection
                    .features
                    .push(Feature::new(geometry, Tags::new(tags)));
            }
            Element::Relation { id, members, tags } => {
                let tags = Tags::new(tags);
                if !tags.is("type", "multipolygon") {
                    skipped += 1;
                    continue;
                }
                match glue_multipolygon(id, &members) {
                    Some(geometry) => collection.features.push(Feature::new(geometry, tags)),
                    None => {
                        warn!("Relation {} didn't form any polygons", id);
                        skipped += 1;
                    }
                }
            }
        }
    }

    info!(
        "Parsed {} features from Overpass, skipping {}",
        prettyprint_usize(collection.len()),
        prettyprint_usize(skipped)
    );
    Ok(collection)
}

/// Assembles the outer and inner ways of a multipolygon relation into polygons. Each hole goes
/// into whichever outer ring contains it.
fn glue_multipolygon(rel_id: i64, members: &[Member]) -> Option<Geometry> {
    let mut outer = Vec::new();
    let mut inner = Vec::new();
    for member in members {
        if member.member_type != "way" {
            continue;
        }
        match member.role.as_str() {
            // An empty role is an old tagging style for outer
            "outer" | "" => outer.push(to_coords(&member.geometry)),
            "inner" => inner.push(to_coords(&member.geometry)),
            role => debug!("Relation {} has unhandled member role {}", rel_id, role),
        }
    }

    let mut polygons: Vec<Polygon> = glue_rings(rel_id, outer)
        .into_iter()
        .map(|ring| Polygon::new(ring, Vec::new()))
        .collect();
    for hole in glue_rings(rel_id, inner) {
        let first = Point::from(hole.0[0]);
        if let Some(polygon) = polygons.iter_mut().find(|p| p.contains(&first)) {
            polygon.interiors_push(hole);
        } else {
            debug!("Relation {} has a hole outside every outer ring", rel_id);
        }
    }

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

/// Joins way pieces end to end into closed rings. Pieces may need to be reversed to fit. Anything
/// that can't be closed by gluing gets its ends connected directly.
fn glue_rings(rel_id: i64, pieces: Vec<Vec<Coord>>) -> Vec<LineString> {
    let mut rings = Vec::new();
    let mut open = Vec::new();
    for pts in pieces {
        if is_closed(&pts) {
            rings.push(LineString::new(pts));
        } else if pts.len() >= 2 {
            open.push(pts);
        }
    }

    while let Some(mut result) = open.pop() {
        let mut reversed = false;
        while result.len() < 2 || result[0] != result[result.len() - 1] {
            let glue_pt = result[result.len() - 1];
            if let Some(idx) = open
                .iter()
                .position(|pts| pts[0] == glue_pt || pts[pts.len() - 1] == glue_pt)
            {
                let mut append = open.remove(idx);
                if append[0] != glue_pt {
                    append.reverse();
                }
                result.pop();
                result.extend(append);
            } else if reversed {
                warn!(
                    "Relation {} has a piece that doesn't connect to anything; closing it directly",
                    rel_id
                );
                break;
            } else {
                // Try gluing onto the other end
                reversed = true;
                result.reverse();
            }
        }

        result.dedup();
        if result.first() != result.last() {
            result.push(result[0]);
        }
        if result.len() >= 4 {
            rings.push(LineString::new(result));
        }
    }
    rings
}
