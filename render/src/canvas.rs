use anyhow::{bail, Context, Result};
use base64::Engine;
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, Polygon};
use svg::node::element::path::Data;
use svg::node::element::{Circle, ClipPath, Definitions, Group, Image, Path, Rectangle};
use svg::Document;

use geom::GPSBounds;
use maputil::prettyprint_usize;

use crate::style::{FIGURE_WIDTH_INCHES, POINTS_PER_INCH};
use crate::MapExtent;

/// Layers are always drawn in this order, no matter what order they're added in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZOrder {
    Hillshade,
    LandCover,
    Hydrology,
    Route,
    Points,
}

impl ZOrder {
    fn id(self) -> &'static str {
        match self {
            ZOrder::Hillshade => "hillshade",
            ZOrder::LandCover => "land-cover",
            ZOrder::Hydrology => "hydrology",
            ZOrder::Route => "route",
            ZOrder::Points => "points",
        }
    }
}

/// Accumulates layers for one figure, in plate carrée: longitude maps to x, latitude to -y.
/// Coordinates in the SVG are pixels at the chosen DPI; everything is clipped to the extent.
pub struct MapCanvas {
    extent: MapExtent,
    dpi: f64,
    width_px: f64,
    height_px: f64,
    layers: Vec<(ZOrder, Group)>,
}

impl MapCanvas {
    pub fn new(extent: MapExtent, dpi: f64) -> Result<MapCanvas> {
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            bail!("Can't draw an empty extent {:?}", extent);
        }
        if !(dpi > 0.0) {
            bail!("DPI must be positive, not {}", dpi);
        }
        let width_px = FIGURE_WIDTH_INCHES * dpi;
        let height_px = width_px * extent.height() / extent.width();
        Ok(MapCanvas {
            extent,
            dpi,
            width_px,
            height_px,
            layers: Vec::new(),
        })
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / POINTS_PER_INCH
    }

    fn project(&self, c: Coord) -> (f64, f64) {
        (
            (c.x - self.extent.min_lon) / self.extent.width() * self.width_px,
            (self.extent.max_lat - c.y) / self.extent.height() * self.height_px,
        )
    }

    /// Stretches an encoded PNG over `bounds`.
    pub fn add_raster(&mut self, png: &[u8], bounds: &GPSBounds) {
        let (x1, y1) = self.project(Coord {
            x: bounds.min_lon,
            y: bounds.max_lat,
        });
        let (x2, y2) = self.project(Coord {
            x: bounds.max_lon,
            y: bounds.min_lat,
        });
        let image = Image::new()
            .set("x", x1)
            .set("y", y1)
            .set("width", x2 - x1)
            .set("height", y2 - y1)
            .set("preserveAspectRatio", "none")
            .set(
                "href",
                format!(
                    "data:image/png;base64,{}",
                    base64::engine::general_purpose::STANDARD.encode(png)
                ),
            );
        self.layers
            .push((ZOrder::Hillshade, Group::new().add(image)));
    }

    /// Fills every areal geometry, without outlines. Anything that isn't a polygon, and any
    /// polygon that's empty, is skipped.
    pub fn add_polygons<'a, I: IntoIterator<Item = &'a Geometry>>(
        &mut self,
        z: ZOrder,
        geometries: I,
        fill: &str,
        opacity: f64,
    ) {
        let mut group = Group::new()
            .set("fill", fill)
            .set("fill-opacity", opacity)
            .set("fill-rule", "evenodd")
            .set("stroke", "none");
        let mut count = 0;
        for geometry in geometries {
            let mut polygons = Vec::new();
            collect_polygons(geometry, &mut polygons);
            let mut data = Data::new();
            let mut empty = true;
            for polygon in polygons {
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    if ring.0.len() < 3 {
                        continue;
                    }
                    data = self.trace(data, ring).close();
                    empty = false;
                }
            }
            if !empty {
                group = group.add(Path::new().set("d", data));
                count += 1;
            }
        }
        debug!("{} layer has {} shapes", z.id(), prettyprint_usize(count));
        self.layers.push((z, group));
    }

    /// Strokes every line. `width` is in points.
    pub fn add_lines(&mut self, z: ZOrder, lines: &MultiLineString, color: &str, width: f64) {
        let mut group = Group::new()
            .set("fill", "none")
            .set("stroke", color)
            .set("stroke-width", self.pt_to_px(width))
            .set("stroke-linejoin", "round")
            .set("stroke-linecap", "square");
        for line in lines {
            if line.0.len() < 2 {
                continue;
            }
            group = group.add(Path::new().set("d", self.trace(Data::new(), line)));
        }
        self.layers.push((z, group));
    }

    /// Draws a circle at every point. `area` is the area of the marker's bounding square, in
    /// square points, and `edge_width` is in points.
    pub fn add_markers(
        &mut self,
        z: ZOrder,
        points: &MultiPoint,
        fill: &str,
        edge: &str,
        area: f64,
        edge_width: f64,
    ) {
        let radius = self.pt_to_px(area.sqrt() / 2.0);
        let mut group = Group::new()
            .set("fill", fill)
            .set("stroke", edge)
            .set("stroke-width", self.pt_to_px(edge_width));
        for pt in points {
            let (x, y) = self.project(pt.0);
            group = group.add(Circle::new().set("cx", x).set("cy", y).set("r", radius));
        }
        self.layers.push((z, group));
    }

    fn trace(&self, mut data: Data, line: &LineString) -> Data {
        for (idx, c) in line.0.iter().enumerate() {
            let pt = self.project(*c);
            data = if idx == 0 {
                data.move_to(pt)
            } else {
                data.line_to(pt)
            };
        }
        data
    }

    /// Assembles every layer, bottom to top.
    pub fn to_svg(&self) -> Document {
        let clip = ClipPath::new().set("id", "extent").add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", self.width_px)
                .set("height", self.height_px),
        );
        let mut map = Group::new().set("clip-path", "url(#extent)");

        let mut layers: Vec<&(ZOrder, Group)> = self.layers.iter().collect();
        // Stable, so layers with the same z stay in the order they were added
        layers.sort_by_key(|(z, _)| *z);
        for (z, group) in layers {
            map = map.add(group.clone().set("id", z.id()));
        }

        let width_in = self.width_px / self.dpi;
        let height_in = self.height_px / self.dpi;
        Document::new()
            .set("width", format!("{}in", width_in))
            .set("height", format!("{}in", height_in))
            .set("viewBox", (0.0, 0.0, self.width_px, self.height_px))
            .add(Definitions::new().add(clip))
            .add(map)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        mapio::create_parent_dir(path)?;
        svg::save(path, &self.to_svg()).with_context(|| format!("writing {}", path))?;
        info!("Saved the map to {}", path);
        Ok(())
    }
}

fn collect_polygons<'a>(geometry: &'a Geometry, out: &mut Vec<&'a Polygon>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0.iter()),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use geo::{point, polygon, MultiPolygon};

    use super::*;

    fn extent() -> MapExtent {
        MapExtent {
            min_lon: -5.0,
            max_lon: -4.0,
            min_lat: 56.0,
            max_lat: 56.5,
        }
    }

    #[test]
    fn projection() {
        let canvas = MapCanvas::new(extent(), 100.0).unwrap();
        assert_eq!(canvas.width_px(), 1650.0);
        assert_eq!(canvas.height_px(), 825.0);
        assert_eq!(canvas.project(Coord { x: -5.0, y: 56.5 }), (0.0, 0.0));
        assert_eq!(canvas.project(Coord { x: -4.0, y: 56.0 }), (1650.0, 825.0));
        assert_eq!(canvas.pt_to_px(72.0), 100.0);
    }

    #[test]
    fn bad_canvas() {
        let mut flat = extent();
        flat.max_lat = flat.min_lat;
        assert!(MapCanvas::new(flat, 100.0).is_err());
        assert!(MapCanvas::new(extent(), 0.0).is_err());
    }

    #[test]
    fn layers_stack_in_order() {
        let mut canvas = MapCanvas::new(extent(), 100.0).unwrap();
        let square = Geometry::Polygon(polygon![
            (x: -4.8, y: 56.1),
            (x: -4.6, y: 56.1),
            (x: -4.6, y: 56.3),
            (x: -4.8, y: 56.1),
        ]);
        // Deliberately added out of order
        canvas.add_markers(
            ZOrder::Points,
            &MultiPoint::new(vec![point!(x: -4.5, y: 56.2)]),
            "#9e5741",
            "#3b2f25",
            130.0,
            3.0,
        );
        canvas.add_polygons(ZOrder::Hydrology, std::iter::once(&square), "#8aa6a3", 1.0);
        canvas.add_lines(
            ZOrder::Route,
            &MultiLineString::new(vec![LineString::from(vec![(-4.9, 56.1), (-4.1, 56.4)])]),
            "#3b2f25",
            3.0,
        );
        canvas.add_polygons(ZOrder::LandCover, std::iter::once(&square), "#6a845e", 0.5);
        canvas.add_raster(b"not really a png", &extent().to_bounds());

        let svg = canvas.to_svg().to_string();
        let positions: Vec<usize> = ["hillshade", "land-cover", "hydrology", "route", "points"]
            .iter()
            .map(|id| {
                svg.find(&format!("id=\"{}\"", id))
                    .unwrap_or_else(|| panic!("no {} layer in {}", id, svg))
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(svg.contains("clip-path=\"url(#extent)\""));
        assert!(svg.contains("data:image/png;base64,"));
    }

    #[test]
    fn empty_geometry_is_skipped() {
        let mut canvas = MapCanvas::new(extent(), 100.0).unwrap();
        let empty = Geometry::MultiPolygon(MultiPolygon::new(Vec::new()));
        let line = Geometry::LineString(LineString::from(vec![(-4.9, 56.1), (-4.1, 56.4)]));
        canvas.add_polygons(ZOrder::LandCover, vec![&empty, &line], "#6a845e", 0.5);
        let svg = canvas.to_svg().to_string();
        assert!(svg.contains("id=\"land-cover\""));
        assert!(!svg.contains("<path"));
    }
}
