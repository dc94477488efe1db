//! Draws the finished map: shaded relief underneath, then land cover, water, the route, and the
//! stops along it.

#[macro_use]
extern crate log;

mod canvas;
mod elevation;
mod extent;
mod hillshade;
pub mod style;

use anyhow::Result;
use geo::{MultiLineString, MultiPoint};

use landcover::{Category, FeatureCollection};
use maputil::Timer;

pub use crate::canvas::{MapCanvas, ZOrder};
pub use crate::elevation::Elevation;
pub use crate::extent::MapExtent;
pub use crate::hillshade::{parse_hex, Colormap, Hillshade, Light};

/// Everything that goes on the map, already cleaned up.
pub struct MapLayers {
    pub elevation: Option<Elevation>,
    pub land_cover: FeatureCollection,
    pub water: FeatureCollection,
    pub route: MultiLineString,
    pub points: MultiPoint,
}

/// Composites every layer onto a canvas covering `extent`.
pub fn compose(
    layers: &MapLayers,
    extent: MapExtent,
    dpi: f64,
    timer: &mut Timer,
) -> Result<MapCanvas> {
    let mut canvas = MapCanvas::new(extent, dpi)?;

    if let Some(ref elevation) = layers.elevation {
        timer.start("hillshade");
        let shade = Hillshade::new(elevation, &Light::default());
        let png = shade.to_png(&Colormap::beige()?)?;
        canvas.add_raster(&png, &elevation.bounds);
        timer.stop("hillshade");
    }

    for (category, color) in [
        (Category::Forest, style::FOREST_COLOR),
        (Category::Grass, style::GRASS_COLOR),
    ] {
        canvas.add_polygons(
            ZOrder::LandCover,
            layers
                .land_cover
                .with_category(category)
                .map(|f| &f.geometry),
            color,
            style::NATURE_ALPHA,
        );
    }
    canvas.add_polygons(
        ZOrder::Hydrology,
        layers.water.features.iter().map(|f| &f.geometry),
        style::WATER_COLOR,
        1.0,
    );
    canvas.add_lines(
        ZOrder::Route,
        &layers.route,
        style::ROUTE_COLOR,
        style::ROUTE_WIDTH,
    );
    canvas.add_markers(
        ZOrder::Points,
        &layers.points,
        style::STEP_COLOR,
        style::ROUTE_COLOR,
        style::MARKER_AREA,
        style::MARKER_EDGE_WIDTH,
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use geo::{point, polygon, Geometry, LineString};

    use geom::{Crs, GPSBounds};
    use landcover::Feature;
    use maputil::Tags;

    use super::*;

    #[test]
    fn composes_every_layer() {
        let mut land_cover = FeatureCollection::new(Crs::Wgs84);
        for category in [Category::Forest, Category::Grass, Category::Other] {
            let mut f = Feature::new(
                Geometry::Polygon(polygon![
                    (x: -4.8, y: 56.1),
                    (x: -4.6, y: 56.1),
                    (x: -4.6, y: 56.3),
                ]),
                Tags::empty(),
            );
            f.category = Some(category);
            land_cover.features.push(f);
        }
        let layers = MapLayers {
            elevation: Some(
                Elevation::new(
                    2,
                    2,
                    vec![10.0, 20.0, 30.0, 40.0],
                    GPSBounds {
                        min_lon: -5.0,
                        min_lat: 56.0,
                        max_lon: -4.0,
                        max_lat: 56.5,
                    },
                )
                .unwrap(),
            ),
            land_cover,
            water: FeatureCollection::new(Crs::Wgs84),
            route: MultiLineString::new(vec![LineString::from(vec![
                (-4.9, 56.1),
                (-4.1, 56.4),
            ])]),
            points: MultiPoint::new(vec![point!(x: -4.5, y: 56.2)]),
        };
        let extent = MapExtent {
            min_lon: -5.0,
            max_lon: -4.0,
            min_lat: 56.0,
            max_lat: 56.5,
        };
        let svg = compose(&layers, extent, 50.0, &mut Timer::throwaway())
            .unwrap()
            .to_svg()
            .to_string();
        assert!(svg.contains(style::FOREST_COLOR));
        assert!(svg.contains(style::GRASS_COLOR));
        assert!(svg.contains(style::STEP_COLOR));
        assert!(svg.contains("data:image/png;base64,"));
        // Forest and grass each got one shape; "other" land isn't drawn
        assert_eq!(svg.matches("<path").count(), 3);
    }
}
