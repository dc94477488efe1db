//! Renders a map of the West Highland Way from a KML export of the route, an elevation raster, and
//! land cover and water from OpenStreetMap.

#[macro_use]
extern crate log;

mod config;

use std::ops::Range;

use anyhow::Result;
use structopt::StructOpt;

use kml::RouteTables;
use landcover::{CleaningParams, MergeParams, OsmQuery};
use maputil::Timer;
use render::{style, Elevation, MapExtent, MapLayers};

#[derive(StructOpt)]
#[structopt(name = "whw", about = "Draws a map of the West Highland Way")]
enum Command {
    /// Run the whole pipeline and write the map
    Render {
        #[structopt(flatten)]
        paths: Paths,
        /// The elevation GeoTIFF. Defaults to res/whw.tif
        #[structopt(long)]
        elevation: Option<String>,
        /// Where to cache OSM land cover. Defaults to res/cached_nature.geojson
        #[structopt(long)]
        nature_cache: Option<String>,
        /// Where to cache OSM water. Defaults to res/cached_lakes_scotland.geojson
        #[structopt(long)]
        water_cache: Option<String>,
        /// Where to write the SVG. Defaults to output/whw.svg
        #[structopt(long)]
        output: Option<String>,
        /// Pixels per inch in the output. Defaults to 500
        #[structopt(long)]
        dpi: Option<f64>,
    },
    /// Only split the KML into points.csv and segments.csv
    Extract {
        #[structopt(flatten)]
        paths: Paths,
    },
}

#[derive(StructOpt)]
struct Paths {
    /// The KML export of the route. Defaults to res/whw.kml
    #[structopt(long)]
    kml: Option<String>,
    /// Where the route tables and caches live. Defaults to res
    #[structopt(long)]
    res_dir: Option<String>,
    /// The first segment of the KML to keep. Defaults to 3
    #[structopt(long)]
    segment_start: Option<usize>,
    /// One past the last segment of the KML to keep. Defaults to 11
    #[structopt(long)]
    segment_end: Option<usize>,
    /// Keep every segment, ignoring --segment-start and --segment-end
    #[structopt(long)]
    all_segments: bool,
    /// Don't write the route tables or the map; just log what would happen
    #[structopt(long)]
    no_save: bool,
}

impl Paths {
    fn kml(&self) -> &str {
        self.kml.as_deref().unwrap_or(config::KML_PATH)
    }

    fn res_dir(&self) -> &str {
        self.res_dir.as_deref().unwrap_or(config::RES_DIR)
    }

    fn segment_slice(&self) -> Option<Range<usize>> {
        if self.all_segments {
            None
        } else {
            Some(
                self.segment_start.unwrap_or(config::SEGMENT_START)
                    ..self.segment_end.unwrap_or(config::SEGMENT_END),
            )
        }
    }

    fn load_route(&self, timer: &mut Timer) -> Result<RouteTables> {
        RouteTables::load_or_extract(
            self.kml(),
            self.res_dir(),
            self.segment_slice(),
            !self.no_save,
            timer,
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    maputil::logger::setup();
    let mut timer = Timer::new("draw the West Highland Way");

    match Command::from_args() {
        Command::Render {
            paths,
            elevation,
            nature_cache,
            water_cache,
            output,
            dpi,
        } => {
            render_map(
                &paths,
                elevation.as_deref().unwrap_or(config::ELEVATION_PATH),
                nature_cache.as_deref().unwrap_or(config::NATURE_CACHE_PATH),
                water_cache.as_deref().unwrap_or(config::WATER_CACHE_PATH),
                output.as_deref().unwrap_or(config::OUTPUT_PATH),
                dpi.unwrap_or(style::DEFAULT_DPI),
                &mut timer,
            )
            .await?
        }
        Command::Extract { paths } => {
            ensure_dir(paths.res_dir())?;
            paths.load_route(&mut timer)?;
        }
    }

    timer.done();
    Ok(())
}

async fn render_map(
    paths: &Paths,
    elevation_path: &str,
    nature_cache: &str,
    water_cache: &str,
    output: &str,
    dpi: f64,
    timer: &mut Timer,
) -> Result<()> {
    ensure_dir(paths.res_dir())?;
    ensure_dir(config::OUTPUT_DIR)?;

    let route = paths.load_route(timer)?;
    let route_bounds = route.segment_bounds();
    let extent = MapExtent::around_route(&route_bounds, style::MAP_ASPECT, style::MARGIN_DEGREES)?;
    let center = route_bounds.center();

    let elevation = Elevation::load(elevation_path, timer)?;

    let mut nature =
        landcover::load_or_fetch(nature_cache, &OsmQuery::nature(), center, timer).await?;
    landcover::assign_categories(&mut nature);
    let mut merge = MergeParams::default();
    merge.cleaning.area_threshold_m2 = config::NATURE_AREA_THRESHOLD_M2;
    let land_cover = landcover::merge_and_stylize(nature, &merge, timer)?;

    let water = landcover::load_or_fetch(water_cache, &OsmQuery::water(), center, timer).await?;
    let water = landcover::filter_and_smooth(
        water,
        &CleaningParams {
            area_threshold_m2: config::WATER_AREA_THRESHOLD_M2,
            ..Default::default()
        },
        timer,
    )?;

    let layers = MapLayers {
        elevation: Some(elevation),
        land_cover,
        water,
        route: route.route_lines(),
        points: route.poi_points(),
    };
    let canvas = render::compose(&layers, extent, dpi, timer)?;
    if paths.no_save {
        timer.note(format!(
            "Not saving the {}x{} map to {}",
            canvas.width_px().round(),
            canvas.height_px().round(),
            output
        ));
    } else {
        canvas.save(output)?;
    }
    Ok(())
}

fn ensure_dir(path: &str) -> Result<()> {
    if !std::path::Path::new(path).exists() {
        fs_err::create_dir_all(path)?;
        info!("Created {}", path);
    }
    Ok(())
}
