//! Land cover and water polygons from OpenStreetMap: fetching and caching them, classifying them,
//! and cleaning the noisy raw shapes into something worth drawing.

#[macro_use]
extern crate log;

mod cache;
mod category;
mod clean;
mod osm;

use geo::Geometry;

use geom::Crs;
use maputil::Tags;

pub use crate::cache::{load_or_fetch, read_geojson, write_geojson};
pub use crate::category::{assign_categories, classify, Category, Rule, CATEGORY_RULES};
pub use crate::clean::{filter_and_smooth, merge_and_stylize, CleaningParams, MergeParams};
pub use crate::osm::{parse_overpass, OsmQuery, OVERPASS_URL};

/// One row of a feature collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub tags: Tags,
    /// Assigned once by `assign_categories`, right after loading.
    pub category: Option<Category>,
}

impl Feature {
    pub fn new(geometry: Geometry, tags: Tags) -> Feature {
        Feature {
            geometry,
            tags,
            category: None,
        }
    }
}

/// A set of features, all expressed in the same coordinate reference system.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCollection {
    pub crs: Crs,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(crs: Crs) -> FeatureCollection {
        FeatureCollection {
            crs,
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features of one category, in order.
    pub fn with_category(&self, category: Category) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(move |f| f.category == Some(category))
    }
}
