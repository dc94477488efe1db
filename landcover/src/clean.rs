use std::collections::BTreeMap;

use anyhow::{bail, Result};
use geo::algorithm::bool_ops::unary_union;
use geo::{Area, Buffer, Geometry, MultiPolygon, Polygon, SimplifyVwPreserve};

use geom::{Crs, MetricFrame};
use maputil::{prettyprint_usize, Tags, Timer};

use crate::{Category, Feature, FeatureCollection};

/// Shared by both cleaning transforms. Distances are meters and areas are square meters, both
/// measured in `working_crs`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CleaningParams {
    pub area_threshold_m2: f64,
    pub smooth_strength_m: f64,
    /// Roughly the largest distance a vertex may move while simplifying.
    pub simplify_tolerance: f64,
    pub input_crs: Crs,
    pub working_crs: Crs,
}

impl Default for CleaningParams {
    fn default() -> CleaningParams {
        CleaningParams {
            area_threshold_m2: 10_000.0,
            smooth_strength_m: 10.0,
            simplify_tolerance: 3.0,
            input_crs: Crs::Wgs84,
            working_crs: Crs::WebMercator,
        }
    }
}

impl CleaningParams {
    fn frame(&self) -> Result<MetricFrame> {
        MetricFrame::new(self.input_crs, self.working_crs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeParams {
    pub cleaning: CleaningParams,
    /// Polygons closer than this to each other fuse into one.
    pub proximity_threshold_m: f64,
}

impl Default for MergeParams {
    fn default() -> MergeParams {
        MergeParams {
            cleaning: CleaningParams {
                area_threshold_m2: 170_000.0,
                smooth_strength_m: 5.0,
                simplify_tolerance: 2.0,
                ..Default::default()
            },
            proximity_threshold_m: 10.0,
        }
    }
}

/// Drops everything too small to see, then rounds off jagged edges and removes redundant vertices
/// from what's left. Every surviving row keeps its tags and category.
pub fn filter_and_smooth(
    input: FeatureCollection,
    params: &CleaningParams,
    timer: &mut Timer,
) -> Result<FeatureCollection> {
    let frame = params.frame()?;
    let num_input = input.len();
    timer.start("filter and smooth");

    let rows = input
        .features
        .into_iter()
        .map(|f| (f.geometry, (f.tags, f.category)))
        .collect();
    let rows = frame.within(rows, |rows| {
        rows.into_iter()
            .filter(|(geom, _)| geom.unsigned_area() > params.area_threshold_m2)
            .map(|(geom, payload)| {
                let smoothed = to_multipolygon(&geom)
                    .buffer(params.smooth_strength_m)
                    .buffer(-params.smooth_strength_m);
                (from_multipolygon(simplify(&smoothed, params)), payload)
            })
            .collect()
    });

    timer.stop("filter and smooth");
    timer.note(format!(
        "{} of {} features survived filtering",
        prettyprint_usize(rows.len()),
        prettyprint_usize(num_input)
    ));

    Ok(FeatureCollection {
        crs: input.crs,
        features: rows
            .into_iter()
            .map(|(geometry, (tags, category))| Feature {
                geometry,
                tags,
                category,
            })
            .collect(),
    })
}

/// Fuses nearby polygons of the same category into a few large, smooth shapes. Every feature must
/// already have a category. The result has one row per disjoint polygon, carrying nothing but the
/// category; `Other` land is dropped entirely.
pub fn merge_and_stylize(
    input: FeatureCollection,
    params: &MergeParams,
    timer: &mut Timer,
) -> Result<FeatureCollection> {
    let frame = params.cleaning.frame()?;
    let mut rows = Vec::new();
    for f in input.features {
        match f.category {
            Some(category) => rows.push((f.geometry, category)),
            None => bail!("Can't merge features; categories must be assigned first"),
        }
    }
    timer.start("merge and stylize");

    let rows = frame.within(rows, |rows| {
        let mut groups: BTreeMap<Category, Vec<MultiPolygon>> = BTreeMap::new();
        for (geom, category) in rows {
            if geom.unsigned_area() > params.cleaning.area_threshold_m2 {
                groups
                    .entry(category)
                    .or_insert_with(Vec::new)
                    .push(to_multipolygon(&geom));
            }
        }

        let mut output = Vec::new();
        for (category, polygons) in groups {
            if category == Category::Other {
                continue;
            }
            let buffered: Vec<MultiPolygon> = polygons
                .iter()
                .map(|p| p.buffer(params.proximity_threshold_m))
                .collect();
            let mut merged = unary_union(&buffered);
            // No inward buffer afterwards, so merged shapes end up slightly larger
            if params.cleaning.smooth_strength_m > 0.0 {
                merged = merged.buffer(params.cleaning.smooth_strength_m);
            }
            let merged = simplify(&merged, &params.cleaning);
            debug!(
                "{} {} polygons merged into {}",
                prettyprint_usize(polygons.len()),
                category,
                prettyprint_usize(merged.0.len())
            );
            for polygon in merged {
                output.push((Geometry::Polygon(polygon), category));
            }
        }
        output
    });

    timer.stop("merge and stylize");
    Ok(FeatureCollection {
        crs: input.crs,
        features: rows
            .into_iter()
            .map(|(geometry, category)| Feature {
                geometry,
                tags: Tags::empty(),
                category: Some(category),
            })
            .collect(),
    })
}

fn simplify(mp: &MultiPolygon, params: &CleaningParams) -> MultiPolygon {
    // Visvalingam works with areas; a tolerance of d meters is about a d*d triangle
    let epsilon = params.simplify_tolerance * params.simplify_tolerance;
    let simplified = mp.simplify_vw_preserve(epsilon);
    MultiPolygon::new(
        simplified
            .into_iter()
            .filter(|p| p.exterior().0.len() >= 4)
            .collect(),
    )
}

/// Only areal geometry survives; points and lines become an empty multipolygon.
fn to_multipolygon(geom: &Geometry) -> MultiPolygon {
    match geom {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
        Geometry::Triangle(t) => MultiPolygon::new(vec![t.to_polygon()]),
        Geometry::GeometryCollection(gc) => {
            MultiPolygon::new(gc.iter().flat_map(|g| to_multipolygon(g).0).collect())
        }
        _ => MultiPolygon::new(Vec::new()),
    }
}

fn from_multipolygon(mut mp: MultiPolygon) -> Geometry {
    if mp.0.len() == 1 {
        let polygon: Polygon = mp.0.remove(0);
        Geometry::Polygon(polygon)
    } else {
        Geometry::MultiPolygon(mp)
    }
}
