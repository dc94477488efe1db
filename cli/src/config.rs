//! Where everything lives and which part of the route gets drawn. Most of these can be overridden
//! with flags.

pub const RES_DIR: &str = "res";
pub const OUTPUT_DIR: &str = "output";

pub const KML_PATH: &str = "res/whw.kml";
pub const ELEVATION_PATH: &str = "res/whw.tif";
pub const NATURE_CACHE_PATH: &str = "res/cached_nature.geojson";
pub const WATER_CACHE_PATH: &str = "res/cached_lakes_scotland.geojson";
pub const OUTPUT_PATH: &str = "output/whw.svg";

/// Only these segments of the KML are part of the walk.
pub const SEGMENT_START: usize = 3;
pub const SEGMENT_END: usize = 11;

/// Woods and fields smaller than this aren't worth drawing, in square meters.
pub const NATURE_AREA_THRESHOLD_M2: f64 = 170_000.0;
/// Likewise for lochs and rivers.
pub const WATER_AREA_THRESHOLD_M2: f64 = 150_000.0;
