use std::io::Cursor;

use anyhow::{bail, Result};
use image::{DynamicImage, ImageOutputFormat, RgbImage};

use crate::style::{
    BEIGE_RAMP, LIGHT_ALTITUDE_DEGREES, LIGHT_AZIMUTH_DEGREES, VERTICAL_EXAGGERATION,
};
use crate::Elevation;

/// Illumination of every cell, in [0, 1], with the same shape as the elevation grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Hillshade {
    pub width: usize,
    pub height: usize,
    pub intensity: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub azimuth_degrees: f64,
    pub altitude_degrees: f64,
    pub vertical_exaggeration: f64,
}

impl Default for Light {
    fn default() -> Light {
        Light {
            azimuth_degrees: LIGHT_AZIMUTH_DEGREES,
            altitude_degrees: LIGHT_ALTITUDE_DEGREES,
            vertical_exaggeration: VERTICAL_EXAGGERATION,
        }
    }
}

impl Light {
    /// Unit vector pointing towards the light. Azimuth is clockwise from north.
    fn direction(&self) -> [f64; 3] {
        let az = (90.0 - self.azimuth_degrees).to_radians();
        let alt = self.altitude_degrees.to_radians();
        [az.cos() * alt.cos(), az.sin() * alt.cos(), alt.sin()]
    }
}

impl Hillshade {
    /// Lambertian shading of the surface normals, with unit cell spacing. Rows run north to
    /// south. The result is stretched to fill [0, 1], unless the terrain is so flat that every cell
    /// is lit the same.
    pub fn new(elevation: &Elevation, light: &Light) -> Hillshade {
        let (w, h) = (elevation.width, elevation.height);
        let z = |x: usize, y: usize| light.vertical_exaggeration * elevation.get(x, y);
        let direction = light.direction();

        let mut intensity = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let dz_dx = gradient(w, x, |i| z(i, y));
                // Row index grows southwards, but the y axis points north
                let dz_dy = -gradient(h, y, |j| z(x, j));

                let normal = [-dz_dx, -dz_dy, 1.0];
                let len = (normal[0].powi(2) + normal[1].powi(2) + 1.0).sqrt();
                intensity.push(
                    (normal[0] * direction[0] + normal[1] * direction[1] + direction[2]) / len,
                );
            }
        }

        let (min, max) = intensity
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), x| (lo.min(*x), hi.max(*x)));
        if max - min > 1e-6 {
            for x in &mut intensity {
                *x = (*x - min) / (max - min);
            }
        }
        for x in &mut intensity {
            *x = x.clamp(0.0, 1.0);
        }

        Hillshade {
            width: w,
            height: h,
            intensity,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.intensity[y * self.width + x]
    }

    /// Colors every cell and encodes the result as a PNG.
    pub fn to_png(&self, colormap: &Colormap) -> Result<Vec<u8>> {
        let img = RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Rgb(colormap.sample(self.get(x as usize, y as usize)))
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut bytes, ImageOutputFormat::Png)?;
        Ok(bytes.into_inner())
    }
}

/// Central differences inside the grid, one-sided differences on the edges.
fn gradient<F: Fn(usize) -> f64>(len: usize, i: usize, f: F) -> f64 {
    if len < 2 {
        0.0
    } else if i == 0 {
        f(1) - f(0)
    } else if i == len - 1 {
        f(i) - f(i - 1)
    } else {
        (f(i + 1) - f(i - 1)) / 2.0
    }
}

/// Evenly spaced color stops, linearly interpolated.
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    stops: Vec<[u8; 3]>,
}

impl Colormap {
    pub fn new(stops: &[&str]) -> Result<Colormap> {
        if stops.len() < 2 {
            bail!("A colormap needs at least two stops");
        }
        Ok(Colormap {
            stops: stops
                .iter()
                .map(|x| parse_hex(x))
                .collect::<Result<Vec<_>>>()?,
        })
    }

    pub fn beige() -> Result<Colormap> {
        Colormap::new(&BEIGE_RAMP)
    }

    /// `t` is clamped to [0, 1].
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (self.stops.len() - 1) as f64;
        let idx = (scaled.floor() as usize).min(self.stops.len() - 2);
        let frac = scaled - idx as f64;
        let (a, b) = (self.stops[idx], self.stops[idx + 1]);
        let mut out = [0; 3];
        for i in 0..3 {
            out[i] = (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
        }
        out
    }
}

/// Parses `#rrggbb`.
pub fn parse_hex(color: &str) -> Result<[u8; 3]> {
    let hex = match color.strip_prefix('#') {
        Some(x) if x.len() == 6 && x.is_ascii() => x,
        _ => bail!("{} isn't a #rrggbb color", color),
    };
    let mut out = [0; 3];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)?;
    }
    Ok(out)
}
