use std::fmt;

use serde::{Deserialize, Serialize};

use maputil::{prettyprint_usize, Tags};

use crate::FeatureCollection;

/// A coarse land cover class. The declaration order is also the drawing and grouping order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Forest,
    Grass,
    /// Unclassified land. Never merged or drawn.
    Other,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Forest => "forest",
            Category::Grass => "grass",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// If the tag `key` has any of `values`, the feature belongs to `category`.
pub struct Rule {
    pub category: Category,
    pub key: &'static str,
    pub values: &'static [&'static str],
}

/// Checked in order; the first matching rule wins. Forest rules come before grass rules.
pub const CATEGORY_RULES: &[Rule] = &[
    Rule {
        category: Category::Forest,
        key: "natural",
        values: &["wood", "tundra"],
    },
    Rule {
        category: Category::Forest,
        key: "landuse",
        values: &["forest"],
    },
    Rule {
        category: Category::Grass,
        key: "natural",
        values: &["heath"],
    },
];

pub fn classify(tags: &Tags) -> Category {
    CATEGORY_RULES
        .iter()
        .find(|rule| tags.is_any(rule.key, rule.values))
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}

/// Label every feature. Call this once, immediately after loading; existing labels are kept.
pub fn assign_categories(collection: &mut FeatureCollection) {
    let mut counts = [0; 3];
    for f in &mut collection.features {
        let category = *f.category.get_or_insert_with(|| classify(&f.tags));
        counts[category as usize] += 1;
    }
    info!(
        "Classified {} features: {} forest, {} grass, {} other",
        prettyprint_usize(collection.len()),
        prettyprint_usize(counts[0]),
        prettyprint_usize(counts[1]),
        prettyprint_usize(counts[2])
    );
}

#[cfg(test)]
mod tests {
    use geo::{point, Geometry};

    use super::*;
    use crate::Feature;

    fn tags(kv: &[(&str, &str)]) -> Tags {
        let mut tags = Tags::empty();
        for (k, v) in kv {
            tags.insert(*k, *v);
        }
        tags
    }

    #[test]
    fn forest_rules() {
        assert_eq!(classify(&tags(&[("natural", "wood")])), Category::Forest);
        assert_eq!(classify(&tags(&[("natural", "tundra")])), Category::Forest);
        assert_eq!(classify(&tags(&[("landuse", "forest")])), Category::Forest);
    }

    #[test]
    fn grass_rules() {
        assert_eq!(classify(&tags(&[("natural", "heath")])), Category::Grass);
    }

    #[test]
    fn farmland_is_not_grass() {
        assert_eq!(classify(&tags(&[("landuse", "meadow")])), Category::Other);
        assert_eq!(classify(&tags(&[("landuse", "farmland")])), Category::Other);
        assert_eq!(classify(&tags(&[("landcover", "crop")])), Category::Other);
        assert_eq!(classify(&tags(&[("landcover", "grass")])), Category::Other);
    }

    #[test]
    fn forest_beats_grass() {
        assert_eq!(
            classify(&tags(&[("natural", "heath"), ("landuse", "forest")])),
            Category::Forest
        );
        assert_eq!(
            classify(&tags(&[("landuse", "meadow"), ("natural", "wood")])),
            Category::Forest
        );
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(classify(&Tags::empty()), Category::Other);
        assert_eq!(classify(&tags(&[("natural", "water")])), Category::Other);
        assert_eq!(classify(&tags(&[("leisure", "park")])), Category::Other);
        assert_eq!(classify(&tags(&[("natural", "scrub")])), Category::Other);
    }

    #[test]
    fn assigned_once() {
        let mut collection = FeatureCollection::new(geom::Crs::Wgs84);
        let pt = Geometry::Point(point!(x: 0.0, y: 0.0));
        collection
            .features
            .push(Feature::new(pt.clone(), tags(&[("natural", "wood")])));
        let mut preassigned = Feature::new(pt, tags(&[("natural", "wood")]));
        preassigned.category = Some(Category::Grass);
        collection.features.push(preassigned);

        assign_categories(&mut collection);
        assert_eq!(collection.features[0].category, Some(Category::Forest));
        assert_eq!(collection.features[1].category, Some(Category::Grass));
        assert_eq!(collection.with_category(Category::Forest).count(), 1);
    }
}
