use anyhow::{bail, Result};
use geo::Geometry;

use crate::Crs;

/// Area and distance operations are meaningless on angular coordinates, so they happen in a
/// metric working frame. `within` is the only way in: it projects the input, runs the metric
/// operations, and always projects whatever comes out back into the input frame, even when the
/// operations bail out early with nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricFrame {
    input: Crs,
    working: Crs,
}

impl MetricFrame {
    pub fn new(input: Crs, working: Crs) -> Result<MetricFrame> {
        if !working.is_metric() {
            bail!("{} isn't a metric frame; can't measure areas in it", working);
        }
        Ok(MetricFrame { input, working })
    }

    /// Project every geometry into the working frame, hand them to `f` along with their payloads,
    /// and project every geometry `f` returns back to the input frame. Rows may be dropped or
    /// added by `f`; the payload travels with its geometry.
    pub fn within<T, F>(&self, rows: Vec<(Geometry, T)>, f: F) -> Vec<(Geometry, T)>
    where
        F: FnOnce(Vec<(Geometry, T)>) -> Vec<(Geometry, T)>,
    {
        let metric = rows
            .into_iter()
            .map(|(geom, payload)| (Crs::reproject(&geom, self.input, self.working), payload))
            .collect();
        f(metric)
            .into_iter()
            .map(|(geom, payload)| (Crs::reproject(&geom, self.working, self.input), payload))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use geo::{point, Area, Polygon};

    use super::*;

    #[test]
    fn rejects_angular_working_frame() {
        assert!(MetricFrame::new(Crs::Wgs84, Crs::Wgs84).is_err());
        assert!(MetricFrame::new(Crs::Wgs84, Crs::WebMercator).is_ok());
    }

    #[test]
    fn closure_sees_meters_and_caller_sees_degrees() {
        let frame = MetricFrame::new(Crs::Wgs84, Crs::WebMercator).unwrap();
        let rows = vec![(Geometry::Point(point!(x: -4.7, y: 56.3)), "kinlochleven")];
        let out = frame.within(rows, |metric| {
            match &metric[0].0 {
                Geometry::Point(pt) => assert!(pt.x() < -500_000.0),
                _ => unreachable!(),
            }
            metric
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, "kinlochleven");
        match &out[0].0 {
            Geometry::Point(pt) => {
                assert!((pt.x() + 4.7).abs() < 1e-9);
                assert!((pt.y() - 56.3).abs() < 1e-9);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn rows_created_in_meters_come_back_in_degrees() {
        let frame = MetricFrame::new(Crs::Wgs84, Crs::WebMercator).unwrap();
        let out: Vec<(Geometry, ())> = frame.within(Vec::new(), |_| {
            // A 1km square at the mercator origin
            let square = Polygon::new(
                vec![(0.0, 0.0), (1000.0, 0.0), (1000.0, 1000.0), (0.0, 1000.0)].into(),
                Vec::new(),
            );
            vec![(Geometry::Polygon(square), ())]
        });
        assert_eq!(out.len(), 1);
        // Roughly 0.009 degrees on each side
        let area = out[0].0.unsigned_area();
        assert!(area > 0.00007 && area < 0.0001, "area {}", area);
    }
}
