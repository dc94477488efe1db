use std::ops::Range;

use anyhow::{Context, Result};
use geo::{LineString, MultiLineString, MultiPoint, Point};
use serde::{Deserialize, Serialize};

use geom::GPSBounds;
use maputil::{prettyprint_usize, Timer};

use crate::{format_coordinates, parse_coordinates, Placemark};

pub const POINTS_CSV: &str = "points.csv";
pub const SEGMENTS_CSV: &str = "segments.csv";

/// The route, split into points of interest and path segments.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RouteTables {
    pub points: Vec<Placemark>,
    pub segments: Vec<Placemark>,
}

/// One CSV row. The column names match what earlier tooling wrote, so old files still load.
#[derive(Serialize, Deserialize)]
struct Row {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Coordinates")]
    coordinates: String,
}

impl RouteTables {
    /// A placemark with exactly one coordinate is a point; more than one is a segment. Placemarks
    /// without any coordinates are dropped. If `segment_slice` is present, only segments in that
    /// index range survive; the range is clamped to however many segments exist.
    pub fn split(placemarks: Vec<Placemark>, segment_slice: Option<Range<usize>>) -> RouteTables {
        let mut points = Vec::new();
        let mut segments = Vec::new();
        for p in placemarks {
            if p.is_point() {
                points.push(p);
            } else if p.is_segment() {
                segments.push(p);
            } else {
                debug!("Skipping placemark {} with no coordinates", p.name);
            }
        }

        if let Some(range) = segment_slice {
            let end = range.end.min(segments.len());
            let start = range.start.min(end);
            segments = segments.drain(start..end).collect();
        }

        RouteTables { points, segments }
    }

    /// Writes `points.csv` and `segments.csv` into `dir`.
    pub fn save(&self, dir: &str) -> Result<()> {
        for (name, rows) in [(POINTS_CSV, &self.points), (SEGMENTS_CSV, &self.segments)] {
            let path = format!("{}/{}", dir, name);
            mapio::create_parent_dir(&path)?;
            let mut writer =
                csv::Writer::from_path(&path).with_context(|| format!("creating {}", path))?;
            for p in rows {
                writer.serialize(Row {
                    name: p.name.clone(),
                    coordinates: format_coordinates(&p.coordinates),
                })?;
            }
            writer.flush()?;
            info!("Saved {} rows to {}", prettyprint_usize(rows.len()), path);
        }
        Ok(())
    }

    /// Reads the tables written by `save`.
    pub fn load(dir: &str) -> Result<RouteTables> {
        Ok(RouteTables {
            points: load_csv(&format!("{}/{}", dir, POINTS_CSV))?,
            segments: load_csv(&format!("{}/{}", dir, SEGMENTS_CSV))?,
        })
    }

    /// Loads the tables from `dir` if both files are there; otherwise extracts them from the KML
    /// file and saves them for next time.
    pub fn load_or_extract(
        kml_path: &str,
        dir: &str,
        segment_slice: Option<Range<usize>>,
        save: bool,
        timer: &mut Timer,
    ) -> Result<RouteTables> {
        let points_path = format!("{}/{}", dir, POINTS_CSV);
        let segments_path = format!("{}/{}", dir, SEGMENTS_CSV);
        if mapio::file_exists(&points_path) && mapio::file_exists(&segments_path) {
            timer.note(format!("Loading existing {} and {}", points_path, segments_path));
            return RouteTables::load(dir);
        }

        timer.note(format!("Extracting segments and points from {}", kml_path));
        let tables = crate::extract(kml_path, segment_slice, timer)?;
        if save {
            tables.save(dir)?;
        }
        Ok(tables)
    }

    /// Every segment as a line, in order.
    pub fn route_lines(&self) -> MultiLineString {
        MultiLineString::new(
            self.segments
                .iter()
                .map(|p| {
                    LineString::new(p.coordinates.iter().map(|c| geo::Coord::from(*c)).collect())
                })
                .collect(),
        )
    }

    /// Every point of interest, placed at its (only) coordinate.
    pub fn poi_points(&self) -> MultiPoint {
        MultiPoint::new(
            self.points
                .iter()
                .filter_map(|p| p.coordinates.first())
                .map(|c| Point::new(c.lon, c.lat))
                .collect(),
        )
    }

    /// The bounds of the route segments, which decide the map extent.
    pub fn segment_bounds(&self) -> GPSBounds {
        let mut b = GPSBounds::new();
        for p in &self.segments {
            for c in &p.coordinates {
                b.update(c.to_lonlat());
            }
        }
        b
    }
}

fn load_csv(path: &str) -> Result<Vec<Placemark>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("opening {}", path))?;
    let mut result = Vec::new();
    for rec in reader.deserialize() {
        let row: Row = rec.with_context(|| format!("reading {}", path))?;
        let coordinates = parse_coordinates(&row.coordinates)
            .with_context(|| format!("{} in {}", row.name, path))?;
        result.push(Placemark {
            name: row.name,
            coordinates,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinate;

    fn placemark(name: &str, n: usize) -> Placemark {
        Placemark {
            name: name.to_string(),
            coordinates: (0..n)
                .map(|i| Coordinate::with_elevation(-4.5 + 0.01 * i as f64, 56.0, 10.0))
                .collect(),
        }
    }

    #[test]
    fn single_coordinate_is_a_point() {
        let tables = RouteTables::split(
            vec![placemark("a", 1), placemark("b", 2), placemark("c", 0)],
            None,
        );
        assert_eq!(tables.points.len(), 1);
        assert_eq!(tables.points[0].name, "a");
        assert_eq!(tables.segments.len(), 1);
        assert_eq!(tables.segments[0].name, "b");
        assert!(tables.segments.iter().all(|p| p.coordinates.len() > 1));
    }

    #[test]
    fn slice_only_applies_to_segments() {
        let mut placemarks = vec![placemark("poi", 1)];
        for i in 0..5 {
            placemarks.push(placemark(&format!("seg{}", i), 3));
        }
        let tables = RouteTables::split(placemarks.clone(), Some(1..3));
        assert_eq!(tables.points.len(), 1);
        assert_eq!(
            tables
                .segments
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>(),
            vec!["seg1", "seg2"]
        );

        // Like a dataframe slice, running off the end just truncates
        let tables = RouteTables::split(placemarks.clone(), Some(3..11));
        assert_eq!(tables.segments.len(), 2);
        let tables = RouteTables::split(placemarks, Some(7..11));
        assert!(tables.segments.is_empty());
    }

    #[test]
    fn csv_round_trip() {
        let dir = std::env::temp_dir().join("kml_csv_round_trip");
        let _ = fs_err::remove_dir_all(&dir);
        let dir = dir.display().to_string();

        let mut with_comma = placemark("Tyndrum, by Crianlarich", 1);
        with_comma.coordinates[0].elevation = None;
        let tables = RouteTables::split(
            vec![with_comma, placemark("Day 1", 4), placemark("Day 2", 2)],
            None,
        );
        tables.save(&dir).unwrap();
        let loaded = RouteTables::load(&dir).unwrap();
        assert_eq!(loaded, tables);

        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn existing_tables_skip_extraction() {
        let dir = std::env::temp_dir().join("kml_existing_tables");
        let _ = fs_err::remove_dir_all(&dir);
        let dir = dir.display().to_string();

        let tables = RouteTables::split(
            vec![placemark("Inversnaid", 1), placemark("Day 3", 3)],
            None,
        );
        tables.save(&dir).unwrap();

        let loaded = RouteTables::load_or_extract(
            "/nonexistent/whw.kml",
            &dir,
            Some(3..11),
            true,
            &mut Timer::throwaway(),
        )
        .unwrap();
        assert_eq!(loaded, tables);

        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_tables_and_kml() {
        let dir = std::env::temp_dir().join("kml_missing_tables");
        let _ = fs_err::remove_dir_all(&dir);
        let err = RouteTables::load_or_extract(
            "/nonexistent/whw.kml",
            &dir.display().to_string(),
            None,
            false,
            &mut Timer::throwaway(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("whw.kml"));
    }

    #[test]
    fn geometry() {
        let tables = RouteTables::split(
            vec![placemark("poi", 1), placemark("Day 1", 3)],
            None,
        );
        let lines = tables.route_lines();
        assert_eq!(lines.0.len(), 1);
        assert_eq!(lines.0[0].0.len(), 3);
        assert_eq!(tables.poi_points().0.len(), 1);

        let b = tables.segment_bounds();
        assert!((b.min_lon + 4.5).abs() < 1e-9);
        assert!((b.max_lon + 4.48).abs() < 1e-9);
    }
}
