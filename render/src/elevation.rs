use std::io::Cursor;

use anyhow::{bail, Context, Result};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use geom::GPSBounds;
use maputil::{prettyprint_usize, Timer};

/// A grid of elevations in meters. Row 0 is the northern edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Elevation {
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` long.
    pub values: Vec<f64>,
    /// The outer edges of the grid, not the centers of the corner cells.
    pub bounds: GPSBounds,
}

impl Elevation {
    pub fn new(width: usize, height: usize, values: Vec<f64>, bounds: GPSBounds) -> Result<Elevation> {
        if width == 0 || height == 0 {
            bail!("An elevation grid needs at least one cell, not {}x{}", width, height);
        }
        if values.len() != width * height {
            bail!(
                "{}x{} elevation grid has {} values",
                width,
                height,
                values.len()
            );
        }
        Ok(Elevation {
            width,
            height,
            values,
            bounds,
        })
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    /// Reads the first band of a GeoTIFF in geographic coordinates. The placement comes from the
    /// ModelTiepoint and ModelPixelScale tags.
    pub fn load(path: &str, timer: &mut Timer) -> Result<Elevation> {
        timer.start(format!("load elevation from {}", path));
        let bytes = mapio::slurp_file(path)?;
        let elevation = Elevation::from_tiff(&bytes).with_context(|| format!("decoding {}", path))?;
        timer.stop(format!("load elevation from {}", path));
        info!(
            "{} is {}x{}, covering {:?}",
            path,
            prettyprint_usize(elevation.width),
            prettyprint_usize(elevation.height),
            elevation.bounds
        );
        Ok(elevation)
    }

    pub fn from_tiff(bytes: &[u8]) -> Result<Elevation> {
        let mut decoder = Decoder::new(Cursor::new(bytes))?;
        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);

        let scale = decoder
            .get_tag_f64_vec(Tag::ModelPixelScaleTag)
            .context("no ModelPixelScale tag")?;
        let tiepoint = decoder
            .get_tag_f64_vec(Tag::ModelTiepointTag)
            .context("no ModelTiepoint tag")?;
        if scale.len() < 2 || tiepoint.len() < 6 {
            bail!(
                "Malformed georeferencing: scale {:?}, tiepoint {:?}",
                scale,
                tiepoint
            );
        }
        // The tiepoint maps raster (i, j) to model (x, y)
        let min_lon = tiepoint[3] - tiepoint[0] * scale[0];
        let max_lat = tiepoint[4] + tiepoint[1] * scale[1];
        let bounds = GPSBounds {
            min_lon,
            min_lat: max_lat - (height as f64) * scale[1],
            max_lon: min_lon + (width as f64) * scale[0],
            max_lat,
        };

        let samples_per_pixel = match decoder.colortype()? {
            tiff::ColorType::Gray(_) => 1,
            tiff::ColorType::GrayA(_) => 2,
            tiff::ColorType::RGB(_) => 3,
            tiff::ColorType::RGBA(_) => 4,
            other => bail!("Unsupported color type {:?}", other),
        };
        let values: Vec<f64> = match decoder.read_image()? {
            DecodingResult::U8(v) => first_band(v, samples_per_pixel),
            DecodingResult::U16(v) => first_band(v, samples_per_pixel),
            DecodingResult::U32(v) => first_band(v, samples_per_pixel),
            DecodingResult::U64(v) => first_band(v.into_iter().map(|x| x as f64), samples_per_pixel),
            DecodingResult::I8(v) => first_band(v, samples_per_pixel),
            DecodingResult::I16(v) => first_band(v, samples_per_pixel),
            DecodingResult::I32(v) => first_band(v, samples_per_pixel),
            DecodingResult::I64(v) => first_band(v.into_iter().map(|x| x as f64), samples_per_pixel),
            DecodingResult::F32(v) => first_band(v, samples_per_pixel),
            DecodingResult::F64(v) => first_band(v, samples_per_pixel),
        };
        Elevation::new(width, height, values, bounds)
    }
}

fn first_band<T: Into<f64>, I: IntoIterator<Item = T>>(samples: I, samples_per_pixel: usize) -> Vec<f64> {
    samples
        .into_iter()
        .step_by(samples_per_pixel)
        .map(|x| x.into())
        .collect()
}

#[cfg(test)]
mod tests {
    use tiff::encoder::{colortype, TiffEncoder};

    use super::*;

    fn geotiff(width: u32, height: u32, values: &[f32]) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut bytes).unwrap();
            let mut image = encoder
                .new_image::<colortype::Gray32Float>(width, height)
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &[0.5, 0.25, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, -5.0, 57.0, 0.0][..])
                .unwrap();
            image.write_data(values).unwrap();
        }
        bytes.into_inner()
    }

    #[test]
    fn reads_georeferenced_floats() {
        let bytes = geotiff(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.5]);
        let elevation = Elevation::from_tiff(&bytes).unwrap();
        assert_eq!(elevation.width, 3);
        assert_eq!(elevation.height, 2);
        assert_eq!(elevation.get(2, 1), 6.5);
        assert_eq!(elevation.get(0, 0), 1.0);
        assert_eq!(
            elevation.bounds,
            GPSBounds {
                min_lon: -5.0,
                min_lat: 56.5,
                max_lon: -3.5,
                max_lat: 57.0,
            }
        );
    }

    #[test]
    fn not_a_tiff() {
        assert!(Elevation::from_tiff(b"definitely not a tiff").is_err());
    }

    #[test]
    fn size_mismatch() {
        assert!(Elevation::new(2, 2, vec![0.0; 3], GPSBounds::new()).is_err());
        assert!(Elevation::new(0, 0, Vec::new(), GPSBounds::new()).is_err());
    }
}
